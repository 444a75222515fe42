//! Validation problems and the per-pass report.

use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Whether a problem fails the pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Problem families, used to scope a run to one group of checks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Naming, identifier and front-matter presence rules.
    Structural,
    /// Front-matter field content and directory correspondence.
    Schema,
    /// Relative links, local pointers and anchors.
    Link,
    /// Unreadable documents.
    Io,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Schema => "schema",
            Self::Link => "link",
            Self::Io => "io",
        }
    }
}

/// Every problem the validators can report.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemKind {
    MissingFrontmatter,
    InvalidRuleId,
    ForbiddenFilename,
    SelfNamedDocument,
    NamingConvention,
    RuleIdMismatch,
    MissingTitle,
    FieldOrder,
    MissingField,
    FieldType,
    DocumentationGlob,
    EmptyList,
    NonCanonicalCase,
    MissingParentDocument,
    UnreferencedChildren,
    BrokenLink,
    BrokenPointer,
    BrokenAnchor,
    LinkTitleMismatch,
    Unreadable,
}

impl ProblemKind {
    /// Stable kebab-case label used in listings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingFrontmatter => "missing-frontmatter",
            Self::InvalidRuleId => "invalid-rule-id",
            Self::ForbiddenFilename => "forbidden-filename",
            Self::SelfNamedDocument => "self-named-document",
            Self::NamingConvention => "naming-convention",
            Self::RuleIdMismatch => "rule-id-mismatch",
            Self::MissingTitle => "missing-title",
            Self::FieldOrder => "field-order",
            Self::MissingField => "missing-field",
            Self::FieldType => "field-type",
            Self::DocumentationGlob => "documentation-glob",
            Self::EmptyList => "empty-list",
            Self::NonCanonicalCase => "non-canonical-case",
            Self::MissingParentDocument => "missing-parent-document",
            Self::UnreferencedChildren => "unreferenced-children",
            Self::BrokenLink => "broken-link",
            Self::BrokenPointer => "broken-pointer",
            Self::BrokenAnchor => "broken-anchor",
            Self::LinkTitleMismatch => "link-title-mismatch",
            Self::Unreadable => "unreadable",
        }
    }

    pub fn category(self) -> Category {
        match self {
            Self::MissingFrontmatter
            | Self::InvalidRuleId
            | Self::ForbiddenFilename
            | Self::SelfNamedDocument
            | Self::NamingConvention
            | Self::RuleIdMismatch
            | Self::MissingTitle => Category::Structural,
            Self::FieldOrder
            | Self::MissingField
            | Self::FieldType
            | Self::DocumentationGlob
            | Self::EmptyList
            | Self::NonCanonicalCase
            | Self::MissingParentDocument
            | Self::UnreferencedChildren => Category::Schema,
            Self::BrokenLink | Self::BrokenPointer | Self::BrokenAnchor | Self::LinkTitleMismatch => {
                Category::Link
            }
            Self::Unreadable => Category::Io,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::EmptyList
            | Self::NonCanonicalCase
            | Self::MissingParentDocument
            | Self::UnreferencedChildren
            | Self::LinkTitleMismatch => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl Display for ProblemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding against one document or directory.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Problem {
    pub kind: ProblemKind,
    /// Corpus-relative POSIX path of the offending document or directory.
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Problem {
    pub fn new(kind: ProblemKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
            line: None,
        }
    }

    /// Attach a 1-based body line number.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// `path` or `path:line`.
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{line}", self.path),
            None => self.path.clone(),
        }
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} - {}", self.kind, self.location(), self.message)
    }
}

/// Ordered errors and warnings accumulated over one validation pass.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ValidationReport {
    errors: Vec<Problem>,
    warnings: Vec<Problem>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem under its kind's severity.
    pub fn push(&mut self, problem: Problem) {
        match problem.severity() {
            Severity::Error => self.errors.push(problem),
            Severity::Warning => self.warnings.push(problem),
        }
    }

    pub fn errors(&self) -> &[Problem] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Problem] {
        &self.warnings
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// `true` when at least one error was recorded; warnings never fail a pass.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Errors and warnings for one path, errors first.
    pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Problem> + 'a {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(move |p| p.path == path)
    }

    /// Paths with at least one problem, in first-report order.
    pub fn paths(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for problem in self.errors.iter().chain(self.warnings.iter()) {
            if !seen.contains(&problem.path.as_str()) {
                seen.push(problem.path.as_str());
            }
        }
        seen
    }

    /// Count of problems of one kind across both severities.
    pub fn count_kind(&self, kind: ProblemKind) -> usize {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .filter(|p| p.kind == kind)
            .count()
    }

    /// Copy of the report restricted to the given categories.
    pub fn filtered(&self, categories: &[Category]) -> Self {
        self.select(|p| categories.contains(&p.category()))
    }

    /// Copy of the report keeping the problems `keep` accepts, in their original order.
    pub fn select(&self, keep: impl Fn(&Problem) -> bool) -> Self {
        Self {
            errors: self.errors.iter().filter(|p| keep(p)).cloned().collect(),
            warnings: self.warnings.iter().filter(|p| keep(p)).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_routes_by_severity() {
        let mut report = ValidationReport::new();
        report.push(Problem::new(ProblemKind::BrokenLink, "a.md", "broken"));
        report.push(Problem::new(ProblemKind::EmptyList, "a.md", "empty"));
        report.push(Problem::new(
            ProblemKind::MissingParentDocument,
            "meta",
            "missing",
        ));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 2);
        assert!(report.has_errors());
        assert_eq!(report.paths(), vec!["a.md", "meta"]);
        assert_eq!(report.for_path("a.md").count(), 2);
    }

    #[test]
    fn warnings_alone_do_not_fail() {
        let mut report = ValidationReport::new();
        report.push(Problem::new(ProblemKind::NonCanonicalCase, "x.md", "case"));
        assert!(!report.has_errors());
    }

    #[test]
    fn filtered_keeps_only_requested_categories() {
        let mut report = ValidationReport::new();
        report.push(Problem::new(ProblemKind::BrokenAnchor, "a.md", "anchor"));
        report.push(Problem::new(ProblemKind::ForbiddenFilename, "README.md", "name"));
        let links = report.filtered(&[Category::Link]);
        assert_eq!(links.error_count(), 1);
        assert_eq!(links.errors()[0].kind, ProblemKind::BrokenAnchor);
    }

    #[test]
    fn display_includes_kind_location_and_message() {
        let problem = Problem::new(ProblemKind::BrokenLink, "docs/a.md", "gone").at_line(3);
        assert_eq!(problem.to_string(), "[broken-link] docs/a.md:3 - gone");
    }
}
