//! Naming rules for documents and the parent-document rule for directories.
//!
//! A document is named after its rule identifier (`<prefix>-<ulid>.md`). A directory that holds
//! documents at any depth is a module directory: its parent directory must contain a document
//! named after it, either `<dir>.md` or `<dir>-<ulid>.md`.

use crate::links::{self, Resolution};
use crate::markdown;
use crate::paths::{basename, stem};
use crate::report::{Problem, ProblemKind, ValidationReport};
use crate::rule_id::RuleId;
use crate::walker::{Corpus, DocRecord};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Directory view of a corpus.
#[derive(Debug, Default)]
pub struct Layout {
    root: PathBuf,
    /// Directories strictly under the root that contain documents at any depth.
    module_dirs: BTreeSet<PathBuf>,
    /// Document indices by containing directory.
    docs_by_dir: BTreeMap<PathBuf, Vec<usize>>,
}

impl Layout {
    pub fn new(corpus: &Corpus) -> Self {
        let root = corpus.root().to_path_buf();
        let mut module_dirs = BTreeSet::new();
        let mut docs_by_dir: BTreeMap<PathBuf, Vec<usize>> = BTreeMap::new();

        for (idx, doc) in corpus.documents().iter().enumerate() {
            let dir = doc.dir();
            docs_by_dir.entry(dir.to_path_buf()).or_default().push(idx);
            for ancestor in dir.ancestors() {
                if ancestor == root || !ancestor.starts_with(&root) {
                    break;
                }
                module_dirs.insert(ancestor.to_path_buf());
            }
        }

        Self {
            root,
            module_dirs,
            docs_by_dir,
        }
    }

    pub fn is_module_dir(&self, dir: &Path) -> bool {
        self.module_dirs.contains(dir)
    }

    /// Module directories in path order.
    pub fn module_dirs(&self) -> impl Iterator<Item = &Path> {
        self.module_dirs.iter().map(PathBuf::as_path)
    }

    fn docs_in<'a>(&self, corpus: &'a Corpus, dir: &Path) -> Vec<&'a DocRecord> {
        self.docs_by_dir
            .get(dir)
            .map(|ids| ids.iter().map(|&i| &corpus.documents()[i]).collect())
            .unwrap_or_default()
    }
}

/// Report a forbidden basename. Returns `true` when the document is forbidden, in which case the
/// remaining naming and front-matter checks do not apply to it.
pub fn check_forbidden(doc: &DocRecord, forbidden: &[String], report: &mut ValidationReport) -> bool {
    let name = doc.stem();
    if !forbidden.iter().any(|f| *f == name) {
        return false;
    }
    let listed: Vec<String> = forbidden.iter().map(|f| format!("`{f}`")).collect();
    report.push(Problem::new(
        ProblemKind::ForbiddenFilename,
        &doc.rel_path,
        format!(
            "forbidden filename `{}`; {} documents are not allowed",
            basename(&doc.path),
            listed.join(", ")
        ),
    ));
    true
}

/// Report a document with no level-1 heading outside code fences.
pub fn check_title(doc: &DocRecord, report: &mut ValidationReport) {
    if markdown::title(&doc.headings).is_none() {
        report.push(Problem::new(
            ProblemKind::MissingTitle,
            &doc.rel_path,
            "document has no level-1 `# ` heading",
        ));
    }
}

/// Check that a document's file name agrees with its identifier and its directory.
pub fn validate_naming(doc: &DocRecord, layout: &Layout, report: &mut ValidationReport) {
    let name = doc.stem();
    let dir = doc.dir();

    if basename(dir) == name {
        report.push(Problem::new(
            ProblemKind::SelfNamedDocument,
            &doc.rel_path,
            format!("document `{name}` has the same name as its directory; move it next to the directory"),
        ));
    }

    let declared = doc.frontmatter.as_ref().and_then(|fm| fm.parsed_rule_id());

    if layout.is_module_dir(&dir.join(&name)) {
        if let Some(id) = declared {
            let lowered = name.to_ascii_lowercase();
            if id.prefix() != lowered && id.canonical() != lowered {
                report.push(Problem::new(
                    ProblemKind::RuleIdMismatch,
                    &doc.rel_path,
                    format!(
                        "module document `{name}` declares ruleId `{id}`; its prefix must be `{lowered}`"
                    ),
                ));
            }
        }
        return;
    }

    match declared {
        Some(id) => {
            let canonical = id.canonical();
            if !name.eq_ignore_ascii_case(&canonical) {
                report.push(Problem::new(
                    ProblemKind::RuleIdMismatch,
                    &doc.rel_path,
                    format!("file name `{name}` does not match ruleId `{id}`"),
                ));
            } else if name != canonical {
                report.push(Problem::new(
                    ProblemKind::NonCanonicalCase,
                    &doc.rel_path,
                    format!("file name `{name}` should be lowercase (`{canonical}`)"),
                ));
            }
        }
        None => match RuleId::parse(&name) {
            Err(err) => report.push(Problem::new(
                ProblemKind::NamingConvention,
                &doc.rel_path,
                format!("file name `{name}` must follow `<prefix>-<ulid>`: {err}"),
            )),
            Ok(id) if name != id.canonical() => report.push(Problem::new(
                ProblemKind::NonCanonicalCase,
                &doc.rel_path,
                format!("file name `{name}` should be lowercase (`{id}`)"),
            )),
            Ok(_) => {}
        },
    }
}

/// Whether `doc_stem` names the parent document of a directory called `dir_name`.
pub fn is_parent_document(doc_stem: &str, dir_name: &str) -> bool {
    doc_stem == dir_name
        || RuleId::parse(doc_stem)
            .map(|id| id.prefix() == dir_name.to_ascii_lowercase())
            .unwrap_or(false)
}

/// Check every module directory for its parent document and the parent for links into it.
pub fn validate_modules(corpus: &Corpus, layout: &Layout, report: &mut ValidationReport) {
    for dir in layout.module_dirs() {
        let name = basename(dir);
        let parent = dir.parent().unwrap_or(&layout.root);
        let display = corpus.display_path(dir);

        let parent_doc = layout
            .docs_in(corpus, parent)
            .into_iter()
            .find(|doc| is_parent_document(&stem(&doc.path), &name));
        let Some(parent_doc) = parent_doc else {
            let ext = &corpus.config().document_extension;
            report.push(Problem::new(
                ProblemKind::MissingParentDocument,
                &display,
                format!(
                    "module directory has no parent document `{name}.{ext}` or `{name}-<ulid>.{ext}` in `{}`",
                    corpus.display_path(parent)
                ),
            ));
            continue;
        };

        if parent_doc.read_error.is_some() || layout.docs_in(corpus, dir).is_empty() {
            continue;
        }
        if !links_into(parent_doc, dir, corpus) {
            report.push(Problem::new(
                ProblemKind::UnreferencedChildren,
                &parent_doc.rel_path,
                format!("parent document does not link to any document in `{display}`"),
            ));
        }
    }
}

fn links_into(doc: &DocRecord, dir: &Path, corpus: &Corpus) -> bool {
    doc.links.iter().any(|link| {
        match links::resolve(link, &doc.path, corpus.root(), corpus.rules()) {
            Resolution::File(path) => path.starts_with(dir),
            _ => false,
        }
    })
}
