//! Shared runtime services for command families.

pub mod config;
pub mod context;
pub mod error;
