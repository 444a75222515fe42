//! Typed configuration loading helpers.

use crate::runtime::error::{XtaskError, XtaskResult};
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Workspace-relative path of the corpus configuration.
pub const CORPUS_CONFIG_PATH: &str = "okite.toml";

/// Generic TOML-backed config loader.
///
/// `ConfigLoader<T>` handles only filesystem access and TOML deserialization. Consuming command
/// domains are still responsible for semantic validation after the typed value is loaded.
///
/// ```rust
/// # use std::path::Path;
/// # use okite_docs::CorpusConfig;
/// # use xtask::runtime::config::ConfigLoader;
/// let loader = ConfigLoader::<CorpusConfig>::new(Path::new("/workspace"), "okite.toml");
/// assert!(loader.path().ends_with("okite.toml"));
/// ```
#[derive(Clone, Debug)]
pub struct ConfigLoader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> ConfigLoader<T>
where
    T: DeserializeOwned,
{
    /// Create a loader for the given workspace-relative path.
    pub fn new(root: &Path, relative_path: &str) -> Self {
        Self {
            path: root.join(relative_path),
            _marker: PhantomData,
        }
    }

    /// Load and deserialize the configuration file.
    ///
    /// Missing files, unreadable files, and TOML parse failures are all surfaced as
    /// [`XtaskErrorCategory::Config`](crate::runtime::error::XtaskErrorCategory::Config).
    pub fn load(&self) -> XtaskResult<T> {
        let body = fs::read_to_string(&self.path).map_err(|err| {
            XtaskError::config(format!("failed to read {}: {err}", self.path.display()))
        })?;
        self.parse(&body)
    }

    /// Like [`ConfigLoader::load`], but an absent file yields `T::default()`.
    pub fn load_or_default(&self) -> XtaskResult<T>
    where
        T: Default,
    {
        match fs::read_to_string(&self.path) {
            Ok(body) => self.parse(&body),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(T::default()),
            Err(err) => Err(XtaskError::config(format!(
                "failed to read {}: {err}",
                self.path.display()
            ))),
        }
    }

    fn parse(&self, body: &str) -> XtaskResult<T> {
        toml::from_str(body).map_err(|err| {
            XtaskError::config(format!("failed to parse {}: {err}", self.path.display()))
        })
    }

    /// Return the config path on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
