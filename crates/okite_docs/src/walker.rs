//! Corpus enumeration and the validation pass.
//!
//! [`Corpus::load`] walks the docs root once, reads every document and indexes its front-matter,
//! headings and links. [`Corpus::validate`] then runs the field, naming and link checks per
//! document and the directory checks over the whole tree.

use crate::config::CorpusConfig;
use crate::error::{CorpusError, CorpusResult};
use crate::frontmatter::{self, FrontMatter};
use crate::links::{self, HeadingIndex, Link, LinkRules};
use crate::markdown::{self, Heading};
use crate::paths::{has_extension, normalize_path, rel_posix, stem};
use crate::report::{Problem, ProblemKind, ValidationReport};
use crate::structure::{self, Layout};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// One document of the corpus.
#[derive(Clone, Debug)]
pub struct DocRecord {
    /// Normalized filesystem path.
    pub path: PathBuf,
    /// Display path, relative to the parent of the docs root (`docs/meta/x.md`).
    pub rel_path: String,
    pub frontmatter: Option<FrontMatter>,
    pub body: String,
    /// Headings with file line numbers.
    pub headings: Vec<Heading>,
    /// Links with file line numbers, documentation examples already removed.
    pub links: Vec<Link>,
    /// Set when the file could not be read as UTF-8 text.
    pub read_error: Option<String>,
}

impl DocRecord {
    fn read(path: PathBuf, display_base: &Path, rules: &LinkRules) -> Self {
        let rel_path = rel_posix(display_base, &path);
        match fs::read_to_string(&path) {
            Ok(text) => Self::from_text(path, rel_path, &text, rules),
            Err(err) => {
                warn!(path = %rel_path, error = %err, "document is unreadable");
                Self {
                    path,
                    rel_path,
                    frontmatter: None,
                    body: String::new(),
                    headings: Vec::new(),
                    links: Vec::new(),
                    read_error: Some(err.to_string()),
                }
            }
        }
    }

    /// Index an already-read document.
    pub fn from_text(path: PathBuf, rel_path: String, text: &str, rules: &LinkRules) -> Self {
        let (front, body) = match frontmatter::split(text) {
            Some((front, body)) => (Some(front), body),
            None => (None, text),
        };
        let offset = text[..text.len() - body.len()].lines().count();

        let mut headings = markdown::headings(body);
        for heading in &mut headings {
            heading.line += offset;
        }
        let mut links = links::extract(body, rules);
        for link in &mut links {
            link.line += offset;
        }

        Self {
            path,
            rel_path,
            frontmatter: front,
            body: body.to_string(),
            headings,
            links,
            read_error: None,
        }
    }

    /// File name without the extension.
    pub fn stem(&self) -> String {
        stem(&self.path)
    }

    /// Directory holding the document.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }
}

/// An enumerated corpus, ready to validate.
#[derive(Debug)]
pub struct Corpus {
    config: CorpusConfig,
    root: PathBuf,
    display_base: PathBuf,
    rules: LinkRules,
    documents: Vec<DocRecord>,
    walk_problems: Vec<Problem>,
}

impl Corpus {
    /// Walk `config.docs_root` and read every document.
    ///
    /// Fails only when the root itself is unusable or the configuration does not compile;
    /// per-file trouble is kept for the report.
    pub fn load(config: &CorpusConfig) -> CorpusResult<Self> {
        let mut root = normalize_path(&config.docs_root);
        if root.as_os_str().is_empty() {
            root = PathBuf::from(".");
        }
        match fs::metadata(&root) {
            Err(_) => return Err(CorpusError::RootNotFound(root)),
            Ok(meta) if !meta.is_dir() => return Err(CorpusError::RootNotDirectory(root)),
            Ok(_) => {}
        }
        let rules = LinkRules::from_config(&config.links)?;
        let exclude = compile_globset(&config.exclude)?;
        let display_base = root.parent().map(Path::to_path_buf).unwrap_or_default();
        let extensions = [config.document_extension.clone()];

        let mut documents = Vec::new();
        let mut walk_problems = Vec::new();
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_pruned(entry, &config.reserved_dirs));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(CorpusError::Walk {
                        path: root.clone(),
                        source: err,
                    })
                }
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    let rel_path = rel_posix(&display_base, &path);
                    warn!(path = %rel_path, error = %err, "skipping unreadable entry");
                    walk_problems.push(Problem::new(
                        ProblemKind::Unreadable,
                        rel_path,
                        format!("failed to read entry: {err}"),
                    ));
                    continue;
                }
            };
            if !entry.file_type().is_file()
                || !has_extension(&entry.path().to_string_lossy(), &extensions)
            {
                continue;
            }
            let within_root = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            if exclude.is_match(within_root) {
                debug!(path = %within_root.display(), "excluded by configuration");
                continue;
            }
            documents.push(DocRecord::read(
                normalize_path(entry.path()),
                &display_base,
                &rules,
            ));
        }

        info!(
            root = %root.display(),
            documents = documents.len(),
            "loaded documentation corpus"
        );
        Ok(Self {
            config: config.clone(),
            root,
            display_base,
            rules,
            documents,
            walk_problems,
        })
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    /// Normalized docs root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rules(&self) -> &LinkRules {
        &self.rules
    }

    /// Documents in walk order.
    pub fn documents(&self) -> &[DocRecord] {
        &self.documents
    }

    /// Report form of a path under the docs root.
    pub fn display_path(&self, path: &Path) -> String {
        rel_posix(&self.display_base, path)
    }

    /// Run every check and collect the findings.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        for problem in &self.walk_problems {
            report.push(problem.clone());
        }

        let layout = Layout::new(self);
        let mut headings = HeadingIndex::from_records(&self.documents);
        for doc in &self.documents {
            self.check_document(doc, &layout, &mut headings, &mut report);
        }
        structure::validate_modules(self, &layout, &mut report);

        info!(
            documents = self.documents.len(),
            errors = report.error_count(),
            warnings = report.warning_count(),
            "validation pass finished"
        );
        report
    }

    /// Run the per-document checks for one file, resolving its links against this corpus.
    ///
    /// A file the walk did not index (excluded, or outside the root) is read on demand. Besides
    /// the usual field, naming and link checks, a readable document without a level-1 heading
    /// gets a `missing-title` error. Directory checks are left to [`Corpus::validate`].
    pub fn validate_file(&self, path: &Path) -> CorpusResult<ValidationReport> {
        let path = normalize_path(path);
        let unindexed;
        let doc = match self.documents.iter().find(|doc| doc.path == path) {
            Some(doc) => doc,
            None if path.is_file() => {
                debug!(path = %path.display(), "reading document outside the index");
                unindexed = DocRecord::read(path, &self.display_base, &self.rules);
                &unindexed
            }
            None => return Err(CorpusError::DocumentNotFound(path)),
        };

        let layout = Layout::new(self);
        let mut headings = HeadingIndex::from_records(&self.documents);
        let mut report = ValidationReport::new();
        if self.check_document(doc, &layout, &mut headings, &mut report) {
            structure::check_title(doc, &mut report);
        }
        info!(
            path = %doc.rel_path,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "single document checked"
        );
        Ok(report)
    }

    /// Field, naming and link checks for one document. Returns `false` when it could not be read.
    fn check_document(
        &self,
        doc: &DocRecord,
        layout: &Layout,
        headings: &mut HeadingIndex,
        report: &mut ValidationReport,
    ) -> bool {
        debug!(path = %doc.rel_path, "validating document");
        if let Some(err) = &doc.read_error {
            report.push(Problem::new(
                ProblemKind::Unreadable,
                &doc.rel_path,
                format!("failed to read document: {err}"),
            ));
            return false;
        }
        if !structure::check_forbidden(doc, &self.config.forbidden_basenames, report) {
            frontmatter::validate_fields(doc.frontmatter.as_ref(), &doc.rel_path, report);
            structure::validate_naming(doc, layout, report);
        }
        links::validate_document(doc, self, headings, report);
        true
    }
}

/// Load and validate in one call.
pub fn validate_corpus(config: &CorpusConfig) -> CorpusResult<ValidationReport> {
    Ok(Corpus::load(config)?.validate())
}

fn is_pruned(entry: &DirEntry, reserved: &[String]) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && reserved.iter().any(|r| *r == name))
}

fn compile_globset(patterns: &[String]) -> CorpusResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| CorpusError::ExcludeGlob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| CorpusError::ExcludeGlob {
        pattern: patterns.join(", "),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, body).expect("write");
    }

    fn doc(rule_id: &str, body: &str) -> String {
        format!("---\ndescription: d\nruleId: {rule_id}\ntags: [t]\naliases: []\nglobs: [\"src/**/*.rs\"]\n---\n{body}")
    }

    fn rel_paths(corpus: &Corpus) -> Vec<String> {
        corpus
            .documents()
            .iter()
            .map(|d| d.rel_path.clone())
            .collect()
    }

    #[test]
    fn load_prunes_hidden_reserved_and_excluded_entries() {
        let dir = TempDir::new().expect("tempdir");
        let docs = dir.path().join("docs");
        write(&docs, "a.md", "");
        write(&docs, ".hidden.md", "");
        write(&docs, ".cache/b.md", "");
        write(&docs, "node_modules/pkg/c.md", "");
        write(&docs, "drafts/d.md", "");
        write(&docs, "notes.txt", "");
        write(&docs, "sub/e.md", "");

        let mut config = CorpusConfig::for_root(&docs);
        config.exclude = vec!["drafts/**".into()];
        let corpus = Corpus::load(&config).expect("load");
        assert_eq!(rel_paths(&corpus), vec!["docs/a.md", "docs/sub/e.md"]);
    }

    #[test]
    fn line_numbers_count_the_front_matter_block() {
        let dir = TempDir::new().expect("tempdir");
        let docs = dir.path().join("docs");
        write(&docs, "a.md", "---\ndescription: a\n---\n# Title\n\n[b](b.md)\n");
        let corpus = Corpus::load(&CorpusConfig::for_root(&docs)).expect("load");
        let doc = &corpus.documents()[0];
        assert_eq!(doc.headings[0].line, 4);
        assert_eq!(doc.links[0].line, 6);
        assert!(doc.frontmatter.is_some());
    }

    #[test]
    fn missing_or_file_root_is_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("nope");
        assert!(matches!(
            Corpus::load(&CorpusConfig::for_root(&missing)),
            Err(CorpusError::RootNotFound(_))
        ));
        write(dir.path(), "file.md", "");
        assert!(matches!(
            Corpus::load(&CorpusConfig::for_root(dir.path().join("file.md"))),
            Err(CorpusError::RootNotDirectory(_))
        ));
    }

    #[test]
    fn bad_exclude_glob_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let mut config = CorpusConfig::for_root(dir.path());
        config.exclude = vec!["[".into()];
        assert!(matches!(
            Corpus::load(&config),
            Err(CorpusError::ExcludeGlob { .. })
        ));
    }

    #[test]
    fn non_utf8_document_becomes_an_unreadable_problem() {
        let dir = TempDir::new().expect("tempdir");
        let docs = dir.path().join("docs");
        fs::create_dir_all(&docs).expect("mkdir");
        fs::write(docs.join("bin.md"), [0xffu8, 0xfe, 0x00]).expect("write");
        let report = validate_corpus(&CorpusConfig::for_root(&docs)).expect("validate");
        assert_eq!(report.count_kind(ProblemKind::Unreadable), 1);
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn unreadable_document_does_not_stop_the_pass() {
        let dir = TempDir::new().expect("tempdir");
        let docs = dir.path().join("docs");
        fs::create_dir_all(&docs).expect("mkdir");
        fs::write(docs.join("a-bin.md"), [0xffu8, 0xfe, 0x00]).expect("write");
        write(
            &docs,
            "b-01jpbn8mms2gdbh8hbk78e6f24.md",
            &doc("b-01jpbn8mms2gdbh8hbk78e6f24", "# B\n\n[gone](gone.md)\n"),
        );

        let report = validate_corpus(&CorpusConfig::for_root(&docs)).expect("validate");
        let found: Vec<(ProblemKind, String)> = report
            .errors()
            .iter()
            .map(|p| (p.kind, p.path.clone()))
            .collect();
        assert_eq!(
            found,
            vec![
                (ProblemKind::Unreadable, "docs/a-bin.md".to_string()),
                (
                    ProblemKind::BrokenLink,
                    "docs/b-01jpbn8mms2gdbh8hbk78e6f24.md".to_string()
                ),
            ]
        );
    }

    #[test]
    fn validate_file_checks_one_document_and_its_title() {
        let dir = TempDir::new().expect("tempdir");
        let docs = dir.path().join("docs");
        let id = "guide-01jpbn8mms2gdbh8hbk78e6f24";
        write(&docs, &format!("{id}.md"), &doc(id, "Intro text only.\n\n[gone](gone.md)\n"));
        write(&docs, "README.md", "");
        let corpus = Corpus::load(&CorpusConfig::for_root(&docs)).expect("load");

        let report = corpus
            .validate_file(&docs.join("sub/../").join(format!("{id}.md")))
            .expect("validate file");
        let kinds: Vec<ProblemKind> = report.errors().iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![ProblemKind::BrokenLink, ProblemKind::MissingTitle]);
    }

    #[test]
    fn validate_file_reads_documents_outside_the_index() {
        let dir = TempDir::new().expect("tempdir");
        let docs = dir.path().join("docs");
        let id = "guide-01jpbn8mms2gdbh8hbk78e6f24";
        write(&docs, &format!("{id}.md"), &doc(id, "# Guide\n"));
        write(&docs, &format!("drafts/{id}.md"), &doc(id, "# Draft\n\n[g](../{id}.md#guide)\n"));
        let mut config = CorpusConfig::for_root(&docs);
        config.exclude = vec!["drafts/**".into()];
        let corpus = Corpus::load(&config).expect("load");
        assert_eq!(corpus.documents().len(), 1);

        let report = corpus
            .validate_file(&docs.join(format!("drafts/{id}.md")))
            .expect("validate file");
        assert!(!report.has_errors(), "{:?}", report.errors());

        assert!(matches!(
            corpus.validate_file(&docs.join("missing.md")),
            Err(CorpusError::DocumentNotFound(_))
        ));
    }
}
