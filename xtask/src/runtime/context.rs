//! Shared command context passed into command families.

use crate::runtime::config::{ConfigLoader, CORPUS_CONFIG_PATH};
use crate::runtime::error::{XtaskError, XtaskResult};
use okite_docs::CorpusConfig;
use std::path::{Path, PathBuf};

/// Shared execution context for xtask command families.
#[derive(Clone, Debug)]
pub struct CommandContext {
    root: PathBuf,
}

impl CommandContext {
    /// Create a new command context rooted at the current workspace.
    pub fn new() -> XtaskResult<Self> {
        Ok(Self::with_root(workspace_root()?))
    }

    /// Context rooted at an explicit directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `path` as given when absolute, otherwise joined onto the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Corpus configuration from `okite.toml` (defaults when absent), with `docs_root` replaced by
    /// `root_override` when given. Relative roots resolve against the workspace root.
    pub fn corpus_config(&self, root_override: Option<&Path>) -> XtaskResult<CorpusConfig> {
        let mut config = ConfigLoader::<CorpusConfig>::new(&self.root, CORPUS_CONFIG_PATH)
            .load_or_default()?;
        if let Some(root) = root_override {
            config.docs_root = root.to_path_buf();
        }
        Ok(config.anchored_at(&self.root))
    }
}

fn workspace_root() -> XtaskResult<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| XtaskError::environment("xtask lives under workspace root"))
}
