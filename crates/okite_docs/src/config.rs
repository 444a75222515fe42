//! Corpus configuration.
//!
//! The shape mirrors `okite.toml`; every field has a default so an absent file or table means the
//! conventional okite layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for one validation pass.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CorpusConfig {
    /// Documentation root. Relative paths are resolved by the caller.
    pub docs_root: PathBuf,
    /// Extension of documents that make up the corpus.
    pub document_extension: String,
    /// Directory names pruned from the walk, at any depth. Hidden entries are always pruned.
    pub reserved_dirs: Vec<String>,
    /// Globs (relative to the docs root) of files to leave out of the corpus.
    pub exclude: Vec<String>,
    /// Basenames that must not be used for documents.
    pub forbidden_basenames: Vec<String>,
    pub links: LinkConfig,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            docs_root: PathBuf::from("docs"),
            document_extension: "md".into(),
            reserved_dirs: vec!["node_modules".into()],
            exclude: Vec::new(),
            forbidden_basenames: vec!["index".into(), "mods".into(), "README".into()],
            links: LinkConfig::default(),
        }
    }
}

impl CorpusConfig {
    /// Default configuration for the given docs root.
    pub fn for_root(docs_root: impl Into<PathBuf>) -> Self {
        Self {
            docs_root: docs_root.into(),
            ..Self::default()
        }
    }

    /// Resolve a relative `docs_root` against `base`.
    pub fn anchored_at(mut self, base: &Path) -> Self {
        if self.docs_root.is_relative() {
            self.docs_root = base.join(&self.docs_root);
        }
        self
    }
}

/// Link extraction and resolution settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// Schemes of corpus-relative pointer links (`mdc:meta/detail`).
    pub pointer_schemes: Vec<String>,
    /// Extensions tried, in order, for relative links written without one.
    pub extensions: Vec<String>,
    /// Extensions tried, in order, for pointer links written without one.
    pub pointer_extensions: Vec<String>,
    /// Leave bare `#fragment` links unchecked.
    pub skip_same_document_anchors: bool,
    /// Warn when link text differs from the target's first level-1 heading.
    pub check_link_titles: bool,
    /// Links that are illustrations in prose rather than real references.
    pub examples: Vec<ExampleRule>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            pointer_schemes: vec!["mdc".into()],
            extensions: vec!["md".into(), "mdc".into()],
            pointer_extensions: vec!["mdc".into(), "md".into()],
            skip_same_document_anchors: false,
            check_link_titles: false,
            examples: default_example_rules(),
        }
    }
}

/// A documentation-example link matcher.
///
/// `target` is a regex matched against the link target; when `text` is set the link text must
/// match it as well.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExampleRule {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ExampleRule {
    pub fn target(pattern: &str) -> Self {
        Self {
            target: pattern.into(),
            text: None,
        }
    }
}

fn default_example_rules() -> Vec<ExampleRule> {
    vec![
        ExampleRule::target("画像のパス"),
        ExampleRule::target("crate::"),
        ExampleRule::target("^capacity:"),
        ExampleRule::target("^seq:"),
        ExampleRule {
            target: "Result".into(),
            text: Some("Result<".into()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchored_at_only_touches_relative_roots() {
        let rel = CorpusConfig::default().anchored_at(Path::new("/repo"));
        assert_eq!(rel.docs_root, PathBuf::from("/repo/docs"));
        let abs = CorpusConfig::for_root("/elsewhere/docs").anchored_at(Path::new("/repo"));
        assert_eq!(abs.docs_root, PathBuf::from("/elsewhere/docs"));
    }

    #[test]
    fn defaults_follow_the_okite_layout() {
        let config = CorpusConfig::default();
        assert_eq!(config.forbidden_basenames, vec!["index", "mods", "README"]);
        assert_eq!(config.links.pointer_schemes, vec!["mdc"]);
        assert_eq!(config.links.extensions, vec!["md", "mdc"]);
        assert!(!config.links.skip_same_document_anchors);
    }
}
