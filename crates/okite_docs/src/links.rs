//! Link classification and resolution.
//!
//! Relative links resolve against the containing document's directory, pointer links
//! (`mdc:meta/detail`) against the docs root. Fragments are checked against the heading anchors of
//! the resolved document, or of the source document when the path part is empty.

use crate::config::LinkConfig;
use crate::error::{CorpusError, CorpusResult};
use crate::frontmatter;
use crate::markdown::{self, RawLink};
use crate::paths::{has_extension, normalize_path};
use crate::report::{Problem, ProblemKind, ValidationReport};
use crate::walker::{Corpus, DocRecord};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a link target is interpreted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LinkKind {
    /// `http(s)://` or another URI scheme; never resolved.
    External,
    /// Path relative to the containing document.
    Relative,
    /// Corpus-relative identifier behind a registered scheme.
    Pointer { scheme: String },
}

/// A classified link.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Link {
    pub kind: LinkKind,
    pub target: String,
    pub text: String,
    /// 1-based line in the document file.
    pub line: usize,
    pub is_image: bool,
}

impl Link {
    /// Split the target into its path part and non-empty fragment. Pointer links lose their
    /// scheme here.
    pub fn split(&self) -> (&str, Option<&str>) {
        let rest = match &self.kind {
            LinkKind::Pointer { scheme } => self
                .target
                .strip_prefix(scheme.as_str())
                .and_then(|t| t.strip_prefix(':'))
                .unwrap_or(&self.target),
            _ => self.target.as_str(),
        };
        match rest.split_once('#') {
            Some((path, fragment)) if !fragment.is_empty() => (path, Some(fragment)),
            Some((path, _)) => (path, None),
            None => (rest, None),
        }
    }
}

#[derive(Clone, Debug)]
struct ExampleMatcher {
    target: Regex,
    text: Option<Regex>,
}

/// Compiled link settings.
#[derive(Clone, Debug)]
pub struct LinkRules {
    pointer_schemes: Vec<String>,
    extensions: Vec<String>,
    pointer_extensions: Vec<String>,
    skip_same_document_anchors: bool,
    check_link_titles: bool,
    examples: Vec<ExampleMatcher>,
}

impl LinkRules {
    pub fn from_config(config: &LinkConfig) -> CorpusResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| CorpusError::ExamplePattern {
                pattern: pattern.to_string(),
                source,
            })
        };
        let examples = config
            .examples
            .iter()
            .map(|rule| {
                Ok(ExampleMatcher {
                    target: compile(&rule.target)?,
                    text: rule.text.as_deref().map(compile).transpose()?,
                })
            })
            .collect::<CorpusResult<Vec<_>>>()?;
        Ok(Self {
            pointer_schemes: config.pointer_schemes.clone(),
            extensions: config.extensions.clone(),
            pointer_extensions: config.pointer_extensions.clone(),
            skip_same_document_anchors: config.skip_same_document_anchors,
            check_link_titles: config.check_link_titles,
            examples,
        })
    }

    /// Extensions that mark a path as a document.
    pub fn document_extensions(&self) -> impl Iterator<Item = &String> {
        self.extensions.iter().chain(self.pointer_extensions.iter())
    }

    fn is_example(&self, raw: &RawLink) -> bool {
        self.examples.iter().any(|m| {
            m.target.is_match(&raw.target) && m.text.as_ref().map_or(true, |t| t.is_match(&raw.text))
        })
    }

    pub fn classify(&self, target: &str) -> LinkKind {
        if let Some((scheme, _)) = target.split_once(':') {
            if self.pointer_schemes.iter().any(|s| s == scheme) {
                return LinkKind::Pointer {
                    scheme: scheme.to_string(),
                };
            }
        }
        if target.starts_with("//") || has_uri_scheme(target) {
            return LinkKind::External;
        }
        LinkKind::Relative
    }
}

fn has_uri_scheme(target: &str) -> bool {
    let Some((scheme, _)) = target.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

/// Extract and classify the links of a document body, dropping documentation examples.
pub fn extract(body: &str, rules: &LinkRules) -> Vec<Link> {
    markdown::links(body)
        .into_iter()
        .filter(|raw| !rules.is_example(raw))
        .map(|raw| Link {
            kind: rules.classify(&raw.target),
            target: raw.target,
            text: raw.text,
            line: raw.line,
            is_image: raw.is_image,
        })
        .collect()
}

/// Outcome of resolving one link.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// External link; accepted as is.
    Unchecked,
    /// Fragment-only link into the source document.
    SameDocument,
    File(PathBuf),
    /// No file at the candidate path or any extension variant of it. Directories never resolve.
    Missing(PathBuf),
}

/// Resolve a link found in `source` against the filesystem.
pub fn resolve(link: &Link, source: &Path, root: &Path, rules: &LinkRules) -> Resolution {
    let (path_part, _) = link.split();
    match &link.kind {
        LinkKind::External => Resolution::Unchecked,
        LinkKind::Relative if path_part.is_empty() => Resolution::SameDocument,
        LinkKind::Relative => {
            let base = match path_part.strip_prefix('/') {
                Some(from_root) => root.join(from_root),
                None => source.parent().unwrap_or(root).join(path_part),
            };
            find_file(normalize_path(&base), &rules.extensions, true)
        }
        LinkKind::Pointer { .. } => {
            let candidate = normalize_path(&root.join(path_part.trim_start_matches('/')));
            if path_part.is_empty() {
                return Resolution::Missing(candidate);
            }
            find_file(candidate, &rules.pointer_extensions, false)
        }
    }
}

fn find_file(candidate: PathBuf, extensions: &[String], accept_as_is: bool) -> Resolution {
    let has_ext = has_extension(&candidate.to_string_lossy(), extensions);
    if (accept_as_is || has_ext) && candidate.is_file() {
        return Resolution::File(candidate);
    }
    if !has_ext {
        for ext in extensions {
            let with_ext = append_extension(&candidate, ext);
            if with_ext.is_file() {
                return Resolution::File(with_ext);
            }
        }
    }
    Resolution::Missing(candidate)
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw = OsString::from(path.as_os_str());
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

/// Heading data of a link target.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TargetHeadings {
    pub anchors: BTreeSet<String>,
    pub title: Option<String>,
}

/// Heading anchors per document, seeded from the corpus and filled lazily for targets outside it.
#[derive(Debug, Default)]
pub struct HeadingIndex {
    entries: HashMap<PathBuf, Option<TargetHeadings>>,
}

impl HeadingIndex {
    pub fn from_records(records: &[DocRecord]) -> Self {
        let entries = records
            .iter()
            .map(|doc| {
                let headings = doc.read_error.is_none().then(|| TargetHeadings {
                    anchors: markdown::anchor_set(&doc.headings),
                    title: markdown::title(&doc.headings).map(str::to_string),
                });
                (doc.path.clone(), headings)
            })
            .collect();
        Self { entries }
    }

    /// Headings of `path`, reading it on first use when it has a document extension.
    pub fn lookup(&mut self, path: &Path, rules: &LinkRules) -> Option<&TargetHeadings> {
        if !self.entries.contains_key(path) {
            let loaded = load_headings(path, rules);
            debug!(path = %path.display(), indexed = loaded.is_some(), "loaded link target headings");
            self.entries.insert(path.to_path_buf(), loaded);
        }
        self.entries.get(path).and_then(Option::as_ref)
    }
}

fn load_headings(path: &Path, rules: &LinkRules) -> Option<TargetHeadings> {
    let known: Vec<String> = rules.document_extensions().cloned().collect();
    if !has_extension(&path.to_string_lossy(), &known) {
        return None;
    }
    let text = fs::read_to_string(path).ok()?;
    let body = frontmatter::split(&text)
        .map(|(_, body)| body)
        .unwrap_or(text.as_str());
    let headings = markdown::headings(body);
    Some(TargetHeadings {
        anchors: markdown::anchor_set(&headings),
        title: markdown::title(&headings).map(str::to_string),
    })
}

/// Check every link of one document.
pub fn validate_document(
    doc: &DocRecord,
    corpus: &Corpus,
    headings: &mut HeadingIndex,
    report: &mut ValidationReport,
) {
    let rules = corpus.rules();
    for link in &doc.links {
        if rules.skip_same_document_anchors
            && link.kind == LinkKind::Relative
            && link.target.starts_with('#')
        {
            continue;
        }
        let (path_part, fragment) = link.split();
        let target = match resolve(link, &doc.path, corpus.root(), rules) {
            Resolution::Unchecked => continue,
            Resolution::SameDocument => doc.path.clone(),
            Resolution::File(path) => path,
            Resolution::Missing(path) => {
                let problem = match link.kind {
                    LinkKind::Pointer { .. } => Problem::new(
                        ProblemKind::BrokenPointer,
                        &doc.rel_path,
                        format!(
                            "broken local-pointer link `{}`: no document `{path_part}` under the docs root",
                            link.target
                        ),
                    ),
                    _ => Problem::new(
                        ProblemKind::BrokenLink,
                        &doc.rel_path,
                        format!(
                            "broken link `{}`: target file does not exist (resolved `{}`)",
                            link.target,
                            corpus.display_path(&path)
                        ),
                    ),
                };
                report.push(problem.at_line(link.line));
                continue;
            }
        };

        let Some(found) = headings.lookup(&target, rules) else {
            continue;
        };
        if let Some(fragment) = fragment {
            if !found.anchors.contains(fragment) {
                let place = if target == doc.path {
                    "this document".to_string()
                } else {
                    format!("`{}`", corpus.display_path(&target))
                };
                report.push(
                    Problem::new(
                        ProblemKind::BrokenAnchor,
                        &doc.rel_path,
                        format!("broken anchor `#{fragment}`: no matching heading in {place}"),
                    )
                    .at_line(link.line),
                );
            }
        }
        if rules.check_link_titles && !link.is_image && target != doc.path {
            if let Some(title) = found.title.as_deref() {
                if link.text.trim() != title {
                    report.push(
                        Problem::new(
                            ProblemKind::LinkTitleMismatch,
                            &doc.rel_path,
                            format!(
                                "link text `{}` differs from the title `{title}` of `{}`",
                                link.text,
                                corpus.display_path(&target)
                            ),
                        )
                        .at_line(link.line),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CorpusConfig, ExampleRule};
    use std::fs;
    use tempfile::TempDir;

    fn rules() -> LinkRules {
        LinkRules::from_config(&LinkConfig::default()).expect("default rules compile")
    }

    fn link(target: &str) -> Link {
        Link {
            kind: rules().classify(target),
            target: target.into(),
            text: "x".into(),
            line: 1,
            is_image: false,
        }
    }

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, body).expect("write");
    }

    #[test]
    fn classify_separates_pointers_external_and_relative() {
        let rules = rules();
        assert_eq!(
            rules.classify("mdc:meta/detail"),
            LinkKind::Pointer {
                scheme: "mdc".into()
            }
        );
        assert_eq!(rules.classify("https://example.com"), LinkKind::External);
        assert_eq!(rules.classify("mailto:docs@example.com"), LinkKind::External);
        assert_eq!(rules.classify("//cdn.example.com/x"), LinkKind::External);
        assert_eq!(rules.classify("./b.md"), LinkKind::Relative);
        assert_eq!(rules.classify("#intro"), LinkKind::Relative);
    }

    #[test]
    fn split_strips_pointer_scheme_and_empty_fragment() {
        assert_eq!(link("mdc:meta#intro").split(), ("meta", Some("intro")));
        assert_eq!(link("b.md#").split(), ("b.md", None));
        assert_eq!(link("#intro").split(), ("", Some("intro")));
    }

    #[test]
    fn extract_drops_documentation_examples() {
        let body = "[capacity](capacity:10) [r](Result) [Result<T>](Result) [img](画像のパス) [ok](b.md)";
        let targets: Vec<String> = extract(body, &rules()).into_iter().map(|l| l.target).collect();
        assert_eq!(targets, vec!["Result".to_string(), "b.md".to_string()]);
    }

    #[test]
    fn invalid_example_pattern_is_a_config_error() {
        let mut config = CorpusConfig::default().links;
        config.examples.push(ExampleRule::target("("));
        assert!(matches!(
            LinkRules::from_config(&config),
            Err(CorpusError::ExamplePattern { .. })
        ));
    }

    #[test]
    fn relative_links_try_as_is_then_extensions_in_order() {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        write(root, "a.md", "");
        write(root, "b.md", "");
        write(root, "c.mdc", "");
        write(root, "both.md", "");
        write(root, "both.mdc", "");
        fs::create_dir_all(root.join("sub")).expect("mkdir");
        write(root, "module.md", "");
        write(root, "module/child.md", "");
        let source = root.join("a.md");
        let rules = rules();

        assert_eq!(
            resolve(&link("./b.md"), &source, root, &rules),
            Resolution::File(root.join("b.md"))
        );
        assert_eq!(
            resolve(&link("c"), &source, root, &rules),
            Resolution::File(root.join("c.mdc"))
        );
        assert_eq!(
            resolve(&link("both#x"), &source, root, &rules),
            Resolution::File(root.join("both.md"))
        );
        assert_eq!(
            resolve(&link("sub"), &source, root, &rules),
            Resolution::Missing(root.join("sub"))
        );
        assert_eq!(
            resolve(&link("module#intro"), &source, root, &rules),
            Resolution::File(root.join("module.md"))
        );
        assert_eq!(
            resolve(&link("missing.md"), &source, root, &rules),
            Resolution::Missing(root.join("missing.md"))
        );
        assert_eq!(
            resolve(&link("#top"), &source, root, &rules),
            Resolution::SameDocument
        );
    }

    #[test]
    fn pointer_links_resolve_from_root_preferring_mdc() {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        write(root, "meta/detail.md", "");
        write(root, "meta/detail.mdc", "");
        write(root, "meta/only.md", "");
        let source = root.join("meta/detail.md");
        let rules = rules();

        assert_eq!(
            resolve(&link("mdc:meta/detail"), &source, root, &rules),
            Resolution::File(root.join("meta/detail.mdc"))
        );
        assert_eq!(
            resolve(&link("mdc:meta/only"), &source, root, &rules),
            Resolution::File(root.join("meta/only.md"))
        );
        assert_eq!(
            resolve(&link("mdc:meta"), &source, root, &rules),
            Resolution::Missing(root.join("meta"))
        );
    }

    #[test]
    fn lookup_reads_targets_outside_the_index_once() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "rule.mdc", "---\ndescription: x\n---\n# Rule Title\n## Usage\n");
        write(dir.path(), "logo.png", "png");
        let rules = rules();
        let mut index = HeadingIndex::default();

        let found = index
            .lookup(&dir.path().join("rule.mdc"), &rules)
            .cloned()
            .expect("headings");
        assert!(found.anchors.contains("usage"));
        assert_eq!(found.title.as_deref(), Some("Rule Title"));
        assert!(index.lookup(&dir.path().join("logo.png"), &rules).is_none());
    }
}
