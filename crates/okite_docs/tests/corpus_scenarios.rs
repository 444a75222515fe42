use okite_docs::{
    validate_corpus, Category, Corpus, CorpusConfig, CorpusError, ProblemKind, ValidationReport,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const META_ID: &str = "meta-01jpbn8mms2gdbh8hbk78e6f24";
const DETAIL_ID: &str = "detail-01jpbn8mms2gdbh8hbk78e6f25";

struct Fixture {
    _dir: TempDir,
    docs: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let docs = dir.path().join("docs");
        fs::create_dir_all(&docs).expect("docs root");
        Self { _dir: dir, docs }
    }

    fn write(&self, rel: &str, text: &str) -> &Self {
        let path = self.docs.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, text).expect("write");
        self
    }

    fn validate(&self) -> ValidationReport {
        validate_corpus(&CorpusConfig::for_root(&self.docs)).expect("validation pass")
    }
}

fn document(rule_id: &str, body: &str) -> String {
    format!(
        "---\ndescription: Example rule\nruleId: {rule_id}\ntags: [docs]\naliases: []\nglobs: [\"src/**/*.rs\"]\n---\n{body}"
    )
}

fn kinds_for(report: &ValidationReport, category: Category) -> Vec<(ProblemKind, String)> {
    let scoped = report.filtered(&[category]);
    scoped
        .errors()
        .iter()
        .map(|p| (p.kind, p.path.clone()))
        .collect()
}

#[test]
fn module_document_is_the_parent_of_its_directory() {
    let fx = Fixture::new();
    fx.write(
        "meta.md",
        &document(META_ID, &format!("# Meta\n\nSee [detail](meta/{DETAIL_ID}.md).\n")),
    )
    .write(&format!("meta/{DETAIL_ID}.md"), &document(DETAIL_ID, "# Detail\n"));

    let report = fx.validate();
    assert_eq!(kinds_for(&report, Category::Structural), Vec::new());
    assert_eq!(report.count_kind(ProblemKind::MissingParentDocument), 0);
    assert_eq!(report.count_kind(ProblemKind::UnreferencedChildren), 0);
    assert!(!report.has_errors(), "{:?}", report.errors());
}

#[test]
fn readme_is_forbidden_whatever_its_front_matter() {
    let fx = Fixture::new();
    fx.write("readme-test/README.md", "not even front matter\n");

    let report = fx.validate();
    assert_eq!(
        kinds_for(&report, Category::Structural),
        vec![(
            ProblemKind::ForbiddenFilename,
            "docs/readme-test/README.md".to_string()
        )]
    );
}

#[test]
fn file_name_must_match_declared_rule_id() {
    let fx = Fixture::new();
    fx.write("x.md", &document("y-01jpbn8mms2gdbh8hbk78e6f24", "# X\n"));

    let report = fx.validate();
    assert_eq!(
        kinds_for(&report, Category::Structural),
        vec![(ProblemKind::RuleIdMismatch, "docs/x.md".to_string())]
    );
    assert_eq!(kinds_for(&report, Category::Link), Vec::new());
}

#[test]
fn missing_sibling_is_one_broken_link() {
    let fx = Fixture::new();
    let id = "a-01jpbn8mms2gdbh8hbk78e6f24";
    fx.write(&format!("{id}.md"), &document(id, "# A\n\n[B](./b.md)\n"));

    let report = fx.validate();
    let broken: Vec<_> = report.filtered(&[Category::Link]).errors().to_vec();
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].kind, ProblemKind::BrokenLink);
    assert!(broken[0].message.contains("./b.md"));
    assert_eq!(broken[0].line, Some(10));
}

#[test]
fn fragments_compare_against_normalized_anchors() {
    let fx = Fixture::new();
    let a = "a-01jpbn8mms2gdbh8hbk78e6f24";
    let b = "b-01jpbn8mms2gdbh8hbk78e6f25";
    fx.write(
        &format!("{a}.md"),
        &document(
            a,
            &format!("# A\n\n[ok]({b}.md#introduction)\n[bad]({b}.md#Introduction)\n[self](#a)\n"),
        ),
    )
    .write(&format!("{b}.md"), &document(b, "# Introduction\n"));

    let report = fx.validate();
    let anchors: Vec<String> = report
        .errors()
        .iter()
        .filter(|p| p.kind == ProblemKind::BrokenAnchor)
        .map(|p| p.message.clone())
        .collect();
    assert_eq!(anchors.len(), 1);
    assert!(anchors[0].contains("#Introduction"));
}

#[test]
fn directory_links_resolve_to_the_parent_document() {
    let fx = Fixture::new();
    let a = "a-01jpbn8mms2gdbh8hbk78e6f26";
    fx.write(
        "meta.md",
        &document(META_ID, &format!("# Meta\n\n[detail](meta/{DETAIL_ID}.md)\n")),
    )
    .write(&format!("meta/{DETAIL_ID}.md"), &document(DETAIL_ID, "# Detail\n"))
    .write(
        &format!("{a}.md"),
        &document(
            a,
            "# A\n\n[ok](meta#meta)\n[typo](meta#no-such-heading)\n[empty](lonely)\n",
        ),
    );
    fs::create_dir_all(fx.docs.join("lonely")).expect("empty dir");

    let report = fx.validate();
    let links: Vec<_> = report.filtered(&[Category::Link]).errors().to_vec();
    assert_eq!(links.len(), 2, "{links:?}");
    assert_eq!(links[0].kind, ProblemKind::BrokenAnchor);
    assert!(links[0].message.contains("#no-such-heading"));
    assert!(links[0].message.contains("docs/meta.md"));
    assert_eq!(links[1].kind, ProblemKind::BrokenLink);
    assert!(links[1].message.contains("lonely"));
}

#[test]
fn pointer_links_resolve_from_the_docs_root() {
    let fx = Fixture::new();
    let a = "a-01jpbn8mms2gdbh8hbk78e6f24";
    fx.write(
        &format!("{a}.md"),
        &document(a, "[meta](mdc:meta)\n[gone](mdc:nowhere/rule)\n"),
    )
    .write(
        "meta.md",
        &document(META_ID, &format!("[detail](mdc:meta/{DETAIL_ID})\n")),
    )
    .write(&format!("meta/{DETAIL_ID}.md"), &document(DETAIL_ID, ""));

    let report = fx.validate();
    assert_eq!(
        kinds_for(&report, Category::Link),
        vec![(ProblemKind::BrokenPointer, format!("docs/{a}.md"))]
    );
    assert_eq!(report.count_kind(ProblemKind::UnreferencedChildren), 0);
}

#[test]
fn example_links_and_fenced_code_are_not_checked() {
    let fx = Fixture::new();
    let a = "a-01jpbn8mms2gdbh8hbk78e6f24";
    fx.write(
        &format!("{a}.md"),
        &document(
            a,
            "[img](画像のパス)\n[Result<T, E>](Result)\n```md\n[x](missing.md)\n```\n[site](https://example.com)\n",
        ),
    );
    assert_eq!(kinds_for(&fx.validate(), Category::Link), Vec::new());
}

#[test]
fn repeated_passes_produce_identical_reports() {
    let fx = Fixture::new();
    fx.write("notes.md", "[x](missing.md)\n")
        .write("README.md", "")
        .write(&format!("orphan/{DETAIL_ID}.md"), &document(DETAIL_ID, ""));

    let corpus = Corpus::load(&CorpusConfig::for_root(&fx.docs)).expect("load");
    let first = corpus.validate();
    let second = corpus.validate();
    assert_eq!(first, second);
    assert_eq!(first, fx.validate());
    assert!(first.has_errors());
    assert_eq!(first.count_kind(ProblemKind::MissingParentDocument), 1);
}

#[test]
fn unusable_root_aborts_the_pass() {
    let fx = Fixture::new();
    let missing = fx.docs.join("absent");
    match validate_corpus(&CorpusConfig::for_root(&missing)) {
        Err(CorpusError::RootNotFound(path)) => assert_eq!(path, missing),
        other => panic!("expected RootNotFound, got {other:?}"),
    }
}

#[test]
fn report_serializes_with_kebab_case_kinds() {
    let fx = Fixture::new();
    fx.write("mods.md", "");
    let json = serde_json_value(&fx.validate());
    assert_eq!(json["errors"][0]["kind"], "forbidden-filename");
    assert_eq!(json["errors"][0]["path"], "docs/mods.md");
}

fn serde_json_value(report: &ValidationReport) -> serde_json::Value {
    serde_json::to_value(report).expect("serialize report")
}
