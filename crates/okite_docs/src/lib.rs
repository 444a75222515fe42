//! Integrity checks for okite documentation corpora.
//!
//! An okite corpus is a directory tree of Markdown rule documents. Each document carries a
//! front-matter block with a `ruleId` of the form `<prefix>-<ulid>`, is named after that
//! identifier, and is reachable from a parent document named after its directory. This crate
//! parses and generates rule identifiers, reads front-matter and links, and validates a corpus in
//! one pass into a [`ValidationReport`].
//!
//! ```no_run
//! use okite_docs::{validate_corpus, CorpusConfig};
//!
//! let report = validate_corpus(&CorpusConfig::for_root("docs"))?;
//! for problem in report.errors() {
//!     eprintln!("{problem}");
//! }
//! # Ok::<(), okite_docs::CorpusError>(())
//! ```

pub mod config;
pub mod error;
pub mod frontmatter;
pub mod links;
pub mod markdown;
pub mod paths;
pub mod report;
pub mod rule_id;
pub mod structure;
pub mod walker;

pub use config::{CorpusConfig, ExampleRule, LinkConfig};
pub use error::{CorpusError, CorpusResult};
pub use frontmatter::FrontMatter;
pub use links::{Link, LinkKind};
pub use report::{Category, Problem, ProblemKind, Severity, ValidationReport};
pub use rule_id::{RuleId, RuleIdError, RuleIdGenerator, Ulid, UlidError};
pub use walker::{validate_corpus, Corpus, DocRecord};
