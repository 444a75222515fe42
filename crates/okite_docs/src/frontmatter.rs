//! Front-matter extraction, serialization and field checks.
//!
//! Only a flat subset of YAML is understood. Between the opening and closing `---` lines, every
//! non-blank line is read as
//!
//! ```text
//! entry := key ':' value
//! value := '[' item (',' item)* ']'     list; items trimmed, one quote layer stripped
//!        | scalar                       raw text after the colon, trimmed
//! ```
//!
//! Lines without a colon are ignored. Nesting, multi-line scalars and comments are not supported.

use crate::report::{Problem, ProblemKind, ValidationReport};
use crate::rule_id::RuleId;
use std::collections::BTreeMap;

/// Front-matter fence line.
pub const DELIMITER: &str = "---";

const DOCUMENTATION_GLOB_EXCEPTIONS: &[&str] = &["**/*.md.tmpl", "**/*.mdx"];

/// Fields the validators know about, declared in canonical order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum KnownField {
    Description,
    RuleId,
    Tags,
    Aliases,
    Globs,
}

impl KnownField {
    pub const CANONICAL_ORDER: [KnownField; 5] = [
        KnownField::Description,
        KnownField::RuleId,
        KnownField::Tags,
        KnownField::Aliases,
        KnownField::Globs,
    ];

    /// Key as written in documents.
    pub fn key(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::RuleId => "ruleId",
            Self::Tags => "tags",
            Self::Aliases => "aliases",
            Self::Globs => "globs",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::CANONICAL_ORDER.into_iter().find(|f| f.key() == key)
    }
}

/// A scalar string or a bracketed list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Parse the raw text to the right of a key's colon.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            Some(inner) => Self::List(
                inner
                    .split(',')
                    .map(|item| strip_quotes(item.trim()).to_string())
                    .filter(|item| !item.is_empty())
                    .collect(),
            ),
            None => Self::Scalar(raw.to_string()),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            Self::Scalar(_) => None,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Scalar(value) => value.clone(),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(|item| render_item(item)).collect();
                format!("[{}]", rendered.join(", "))
            }
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        let last = bytes[value.len() - 1];
        if (bytes[0] == b'"' && last == b'"') || (bytes[0] == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn render_item(item: &str) -> String {
    let plain = item
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ' '))
        && !item.starts_with(' ')
        && !item.ends_with(' ');
    if plain {
        item.to_string()
    } else if item.contains('"') {
        format!("'{item}'")
    } else {
        format!("\"{item}\"")
    }
}

/// Parsed front-matter block.
///
/// Known fields are typed slots; anything else lands in `extra`. The first-occurrence order of
/// known fields is kept for the ordering check.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FrontMatter {
    pub description: Option<FieldValue>,
    pub rule_id: Option<FieldValue>,
    pub tags: Option<FieldValue>,
    pub aliases: Option<FieldValue>,
    pub globs: Option<FieldValue>,
    pub extra: BTreeMap<String, FieldValue>,
    order: Vec<KnownField>,
}

impl FrontMatter {
    /// Parse the lines between the fences.
    pub fn parse_block(raw: &str) -> Self {
        let mut fm = Self::default();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            fm.insert(key, FieldValue::parse(value));
        }
        fm
    }

    /// Set a field. A repeated key keeps its first position and takes the latest value.
    pub fn insert(&mut self, key: &str, value: FieldValue) {
        let Some(field) = KnownField::from_key(key) else {
            self.extra.insert(key.to_string(), value);
            return;
        };
        if !self.order.contains(&field) {
            self.order.push(field);
        }
        *self.slot_mut(field) = Some(value);
    }

    pub fn field(&self, field: KnownField) -> Option<&FieldValue> {
        match field {
            KnownField::Description => self.description.as_ref(),
            KnownField::RuleId => self.rule_id.as_ref(),
            KnownField::Tags => self.tags.as_ref(),
            KnownField::Aliases => self.aliases.as_ref(),
            KnownField::Globs => self.globs.as_ref(),
        }
    }

    fn slot_mut(&mut self, field: KnownField) -> &mut Option<FieldValue> {
        match field {
            KnownField::Description => &mut self.description,
            KnownField::RuleId => &mut self.rule_id,
            KnownField::Tags => &mut self.tags,
            KnownField::Aliases => &mut self.aliases,
            KnownField::Globs => &mut self.globs,
        }
    }

    /// Look up any field by its document key.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        match KnownField::from_key(key) {
            Some(field) => self.field(field),
            None => self.extra.get(key),
        }
    }

    /// Known fields in the order they first appeared.
    pub fn recognized_order(&self) -> &[KnownField] {
        &self.order
    }

    /// Whether the known fields appear as a subsequence of [`KnownField::CANONICAL_ORDER`].
    pub fn is_canonical_order(&self) -> bool {
        self.order.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// Raw `ruleId` text when it is a scalar.
    pub fn rule_id_text(&self) -> Option<&str> {
        self.rule_id.as_ref().and_then(FieldValue::as_scalar)
    }

    /// Parsed `ruleId`, if present and valid.
    pub fn parsed_rule_id(&self) -> Option<RuleId> {
        self.rule_id_text().and_then(|text| RuleId::parse(text).ok())
    }
}

/// Split a document into its front-matter and body.
///
/// Returns `None` unless the first line is `---` and a later line closes the block.
pub fn split(text: &str) -> Option<(FrontMatter, &str)> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }
    let block_start = first.len();
    let mut offset = block_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            let front = FrontMatter::parse_block(&text[block_start..offset]);
            return Some((front, &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Extract only the front-matter of a document.
pub fn extract(text: &str) -> Option<FrontMatter> {
    split(text).map(|(front, _)| front)
}

/// Render a front-matter block with known fields in canonical order, then extras by key.
pub fn serialize(front: &FrontMatter) -> String {
    let mut out = String::from(DELIMITER);
    out.push('\n');
    for field in KnownField::CANONICAL_ORDER {
        if let Some(value) = front.field(field) {
            out.push_str(&format!("{}: {}\n", field.key(), value.render()));
        }
    }
    for (key, value) in &front.extra {
        out.push_str(&format!("{key}: {}\n", value.render()));
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out
}

/// Whether a `globs` entry points at documentation instead of source files.
pub fn is_documentation_glob(pattern: &str) -> bool {
    (pattern.contains(".md") || pattern.contains("docs/"))
        && !DOCUMENTATION_GLOB_EXCEPTIONS.contains(&pattern)
}

/// Check presence, order and content of the front-matter fields of one document.
pub fn validate_fields(front: Option<&FrontMatter>, path: &str, report: &mut ValidationReport) {
    let Some(front) = front else {
        report.push(Problem::new(
            ProblemKind::MissingFrontmatter,
            path,
            "document does not start with a `---` front-matter block",
        ));
        return;
    };

    if !front.is_canonical_order() {
        let expected: Vec<&str> = KnownField::CANONICAL_ORDER.iter().map(|f| f.key()).collect();
        let found: Vec<&str> = front.recognized_order().iter().map(|f| f.key()).collect();
        report.push(Problem::new(
            ProblemKind::FieldOrder,
            path,
            format!(
                "front-matter fields out of order: expected `{}`, found `{}`",
                expected.join(", "),
                found.join(", ")
            ),
        ));
    }

    required_scalar(front, KnownField::Description, path, report);

    if let Some(text) = required_scalar(front, KnownField::RuleId, path, report) {
        match RuleId::parse(text) {
            Err(err) => report.push(Problem::new(
                ProblemKind::InvalidRuleId,
                path,
                format!("`ruleId` `{text}` is invalid: {err}"),
            )),
            Ok(id) if !id.has_canonical_case() => report.push(Problem::new(
                ProblemKind::NonCanonicalCase,
                path,
                format!("`ruleId` `{text}` should be lowercase (`{id}`)"),
            )),
            Ok(_) => {}
        }
    }

    if let Some(tags) = required_list(front, KnownField::Tags, path, report) {
        if tags.is_empty() {
            report.push(Problem::new(
                ProblemKind::EmptyList,
                path,
                "`tags` is empty; at least one tag is expected",
            ));
        }
    }

    if let Some(globs) = required_list(front, KnownField::Globs, path, report) {
        if globs.is_empty() {
            report.push(Problem::new(
                ProblemKind::EmptyList,
                path,
                "`globs` is empty; at least one source pattern is expected",
            ));
        }
        for pattern in globs.iter().filter(|p| is_documentation_glob(p)) {
            report.push(Problem::new(
                ProblemKind::DocumentationGlob,
                path,
                format!("`globs` pattern `{pattern}` targets documentation; use source file patterns"),
            ));
        }
    }

    if let Some(FieldValue::Scalar(value)) = &front.aliases {
        if !value.is_empty() {
            report.push(Problem::new(
                ProblemKind::FieldType,
                path,
                "`aliases` must be a `[...]` list",
            ));
        }
    }
}

fn required_scalar<'a>(
    front: &'a FrontMatter,
    field: KnownField,
    path: &str,
    report: &mut ValidationReport,
) -> Option<&'a str> {
    match front.field(field) {
        Some(FieldValue::Scalar(value)) if !value.is_empty() => Some(value),
        Some(FieldValue::List(_)) => {
            report.push(Problem::new(
                ProblemKind::FieldType,
                path,
                format!("`{}` must be a single value, not a list", field.key()),
            ));
            None
        }
        _ => {
            report.push(Problem::new(
                ProblemKind::MissingField,
                path,
                format!("missing required field `{}`", field.key()),
            ));
            None
        }
    }
}

fn required_list<'a>(
    front: &'a FrontMatter,
    field: KnownField,
    path: &str,
    report: &mut ValidationReport,
) -> Option<&'a [String]> {
    match front.field(field) {
        Some(FieldValue::List(items)) => Some(items),
        Some(FieldValue::Scalar(value)) if !value.is_empty() => {
            report.push(Problem::new(
                ProblemKind::FieldType,
                path,
                format!("`{}` must be a `[...]` list", field.key()),
            ));
            None
        }
        _ => {
            report.push(Problem::new(
                ProblemKind::MissingField,
                path,
                format!("missing required field `{}`", field.key()),
            ));
            None
        }
    }
}
