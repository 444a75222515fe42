//! Errors that abort a validation pass.
//!
//! Everything that concerns a single document is reported through
//! [`ValidationReport`](crate::report::ValidationReport) instead.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal corpus-level failures.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("docs root `{}` does not exist", .0.display())]
    RootNotFound(PathBuf),
    #[error("docs root `{}` is not a directory", .0.display())]
    RootNotDirectory(PathBuf),
    #[error("document `{}` does not exist", .0.display())]
    DocumentNotFound(PathBuf),
    #[error("invalid example link pattern `{pattern}`: {source}")]
    ExamplePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid exclude glob `{pattern}`: {source}")]
    ExcludeGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("failed to read docs root `{}`: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Convenience result type for corpus operations.
pub type CorpusResult<T> = Result<T, CorpusError>;
