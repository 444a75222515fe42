//! Documentation validation command family.

use crate::runtime::context::CommandContext;
use crate::runtime::error::{XtaskError, XtaskResult};
use crate::XtaskCommand;
use chrono::{SecondsFormat, Utc};
use okite_docs::{Category, Corpus, Problem, ProblemKind, Severity, ValidationReport};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Which checks a docs run reports.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DocsCheck {
    All,
    Frontmatter,
    Structure,
    Links,
}

impl DocsCheck {
    /// Whether problems of `kind` belong to this check.
    pub fn includes(self, kind: ProblemKind) -> bool {
        use ProblemKind::*;
        match self {
            DocsCheck::All => true,
            DocsCheck::Frontmatter => matches!(
                kind,
                MissingFrontmatter
                    | InvalidRuleId
                    | FieldOrder
                    | MissingField
                    | FieldType
                    | DocumentationGlob
                    | EmptyList
                    | NonCanonicalCase
                    | Unreadable
            ),
            DocsCheck::Structure => matches!(
                kind,
                ForbiddenFilename
                    | SelfNamedDocument
                    | NamingConvention
                    | RuleIdMismatch
                    | MissingTitle
                    | NonCanonicalCase
                    | MissingParentDocument
                    | UnreferencedChildren
                    | Unreadable
            ),
            DocsCheck::Links => kind.category() == Category::Link || kind == Unreadable,
        }
    }
}

/// Requested docs action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DocsAction {
    Check(DocsCheck),
    /// Per-document checks for one file, plus the title check.
    File { path: PathBuf },
    AuditReport { output: PathBuf },
    Help,
}

/// Parsed `cargo xtask docs` options.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DocsOptions {
    pub action: DocsAction,
    /// Docs root overriding `okite.toml`.
    pub root: Option<PathBuf>,
}

/// `cargo xtask docs ...`
pub struct DocsCommand;

impl XtaskCommand for DocsCommand {
    type Options = DocsOptions;

    fn parse(args: &[String]) -> XtaskResult<Self::Options> {
        parse_docs_options(args)
    }

    fn run(ctx: &CommandContext, options: Self::Options) -> XtaskResult<()> {
        let check = match &options.action {
            DocsAction::Help => {
                print_docs_usage();
                return Ok(());
            }
            DocsAction::Check(check) => *check,
            DocsAction::File { .. } | DocsAction::AuditReport { .. } => DocsCheck::All,
        };

        let config = ctx.corpus_config(options.root.as_deref())?;
        let corpus = Corpus::load(&config)?;
        if let DocsAction::File { path } = &options.action {
            let report = corpus.validate_file(&ctx.resolve(path))?;
            return fail_if_errors(&report);
        }
        let report = corpus.validate().select(|p| check.includes(p.kind));

        if let DocsAction::AuditReport { output } = &options.action {
            write_audit_report(&corpus, &report, &ctx.resolve(output))?;
        }
        fail_if_errors(&report)
    }
}

fn parse_docs_options(args: &[String]) -> XtaskResult<DocsOptions> {
    let mut options = DocsOptions {
        action: DocsAction::Help,
        root: None,
    };
    let mut output: Option<PathBuf> = None;
    let mut file: Option<PathBuf> = None;

    let Some(command) = args.first().map(String::as_str) else {
        return Ok(options);
    };
    let check = match command {
        "help" | "--help" | "-h" => return Ok(options),
        "check" | "all" => Some(DocsCheck::All),
        "frontmatter" => Some(DocsCheck::Frontmatter),
        "structure" => Some(DocsCheck::Structure),
        "links" => Some(DocsCheck::Links),
        "audit-report" | "file" => None,
        other => {
            return Err(XtaskError::validation(format!(
                "unsupported docs command: {other}"
            ))
            .with_hint("run `cargo xtask docs help`"))
        }
    };

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--root" => {
                let Some(value) = args.get(i + 1) else {
                    return Err(XtaskError::validation("missing value for `--root`"));
                };
                options.root = Some(PathBuf::from(value));
                i += 2;
            }
            "--output" => {
                let Some(value) = args.get(i + 1) else {
                    return Err(XtaskError::validation("missing value for `--output`"));
                };
                output = Some(PathBuf::from(value));
                i += 2;
            }
            other if command == "file" && file.is_none() && !other.starts_with("--") => {
                file = Some(PathBuf::from(other));
                i += 1;
            }
            other => {
                return Err(XtaskError::validation(format!(
                    "unsupported docs flag: {other}"
                )))
            }
        }
    }

    if command == "file" {
        if output.is_some() {
            return Err(XtaskError::validation(
                "`--output` is only valid with `audit-report`",
            ));
        }
        let path = file.ok_or_else(|| {
            XtaskError::validation("missing `<path>`")
                .with_hint("usage: cargo xtask docs file <path> [--root <dir>]")
        })?;
        options.action = DocsAction::File { path };
        return Ok(options);
    }

    options.action = match (check, output) {
        (Some(check), None) => DocsAction::Check(check),
        (Some(_), Some(_)) => {
            return Err(XtaskError::validation(
                "`--output` is only valid with `audit-report`",
            ))
        }
        (None, Some(output)) => DocsAction::AuditReport { output },
        (None, None) => return Err(XtaskError::validation("missing `--output <path>`")),
    };
    Ok(options)
}

fn print_docs_usage() {
    eprintln!(
        "Usage: cargo xtask docs <command> [--root <dir>]\n\
         \n\
         Commands:\n\
           check                             Run every corpus check\n\
           frontmatter                       Validate front-matter presence, order and fields\n\
           structure                         Validate file naming and parent documents\n\
           links                             Validate relative links, local pointers and anchors\n\
           file <path>                       Check one document, including its `# ` title\n\
           audit-report --output <path>      Write a JSON audit report, then fail on errors\n\
         \n\
         The docs root defaults to `docs_root` in okite.toml, or `docs/`.\n"
    );
}

fn fail_if_errors(report: &ValidationReport) -> XtaskResult<()> {
    for path in report.paths() {
        for problem in report.for_path(path) {
            print_problem(problem);
        }
    }

    if report.has_errors() {
        println!(
            "\nFAILED: {} error(s), {} warning(s)",
            report.error_count(),
            report.warning_count()
        );
        return Err(XtaskError::validation("docs validation failed")
            .with_operation("docs")
            .with_hint("fix the errors listed above"));
    }
    if report.warning_count() > 0 {
        println!("\nOK: {} warning(s)", report.warning_count());
    } else {
        println!("OK");
    }
    Ok(())
}

fn print_problem(problem: &Problem) {
    match problem.severity() {
        Severity::Error => println!("{problem}"),
        Severity::Warning => println!("warning: {problem}"),
    }
}

fn write_audit_report(
    corpus: &Corpus,
    report: &ValidationReport,
    output: &Path,
) -> XtaskResult<()> {
    let mut counts_by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    let mut counts_by_category: BTreeMap<&str, usize> = BTreeMap::new();
    for problem in report.errors().iter().chain(report.warnings()) {
        *counts_by_kind.entry(problem.kind.as_str()).or_default() += 1;
        *counts_by_category
            .entry(problem.category().as_str())
            .or_default() += 1;
    }

    let body = json!({
        "generated_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "docs_root": corpus.display_path(corpus.root()),
        "document_count": corpus.documents().len(),
        "error_count": report.error_count(),
        "warning_count": report.warning_count(),
        "counts_by_kind": counts_by_kind,
        "counts_by_category": counts_by_category,
        "report": report,
    });

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            XtaskError::io(format!("failed to create {}: {err}", parent.display()))
                .with_operation("docs audit-report")
        })?;
    }
    let text = serde_json::to_string_pretty(&body)
        .map_err(|err| XtaskError::io(format!("failed to serialize report: {err}")))?;
    fs::write(output, format!("{text}\n")).map_err(|err| {
        XtaskError::io(format!("failed to write audit report: {err}")).with_path(output)
    })?;
    info!(output = %output.display(), "wrote audit report");
    println!("Wrote audit report: {}", output.display());
    Ok(())
}
