//! Top-level command families.

pub mod docs;
pub mod rule_id;
