//! The slice of Markdown the validators read: fences, ATX headings and inline links.

use std::collections::{BTreeSet, HashMap};

/// An ATX heading outside fenced code.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    /// Normalized anchor id; repeated anchors get `-1`, `-2`, ... suffixes. Empty when the text
    /// normalizes to nothing.
    pub anchor: String,
    /// 1-based line within the scanned text.
    pub line: usize,
}

/// An inline `[text](target)` or `![alt](target)` occurrence outside fenced code.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawLink {
    pub text: String,
    pub target: String,
    pub line: usize,
    pub is_image: bool,
}

/// Tracks whether the scan is inside a fenced code block.
#[derive(Debug, Default)]
struct FenceState {
    open: bool,
}

impl FenceState {
    /// Returns `true` when the line is fenced (including the fence lines themselves).
    fn skip(&mut self, line: &str) -> bool {
        if line.trim_start().starts_with("```") {
            self.open = !self.open;
            return true;
        }
        self.open
    }
}

/// Collect headings with their anchors.
pub fn headings(body: &str) -> Vec<Heading> {
    let mut out = Vec::new();
    let mut fence = FenceState::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (idx, line) in body.lines().enumerate() {
        if fence.skip(line) {
            continue;
        }
        let Some((level, text)) = parse_heading(line) else {
            continue;
        };
        let base = slugify(text);
        let anchor = if base.is_empty() {
            base
        } else {
            let count = seen.entry(base.clone()).or_insert(0);
            let anchor = if *count == 0 {
                base
            } else {
                format!("{base}-{count}")
            };
            *count += 1;
            anchor
        };
        out.push(Heading {
            level,
            text: text.to_string(),
            anchor,
            line: idx + 1,
        });
    }

    out
}

/// The non-empty anchors of a heading list.
pub fn anchor_set(headings: &[Heading]) -> BTreeSet<String> {
    headings
        .iter()
        .filter(|h| !h.anchor.is_empty())
        .map(|h| h.anchor.clone())
        .collect()
}

/// Text of the first level-1 heading.
pub fn title(headings: &[Heading]) -> Option<&str> {
    headings
        .iter()
        .find(|h| h.level == 1)
        .map(|h| h.text.as_str())
}

fn parse_heading(line: &str) -> Option<(u8, &str)> {
    let bytes = line.as_bytes();
    let mut count = 0usize;
    while count < bytes.len() && bytes[count] == b'#' {
        count += 1;
    }
    if count == 0 || count > 6 {
        return None;
    }
    if bytes.get(count).copied().map(|b| b.is_ascii_whitespace()) != Some(true) {
        return None;
    }
    let text = line[count..].trim();
    if text.is_empty() {
        return None;
    }
    Some((count as u8, text))
}

/// Normalize heading text to an anchor id.
///
/// Lowercases, turns each whitespace run into `-` and drops every character that is neither a
/// word character (alphanumeric or `_`) nor `-`.
pub fn slugify(text: &str) -> String {
    let mut out = String::new();
    let mut pending_space = false;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push('-');
            pending_space = false;
        }
        if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Collect inline links outside fenced code.
pub fn links(body: &str) -> Vec<RawLink> {
    let mut out = Vec::new();
    let mut fence = FenceState::default();

    for (idx, line) in body.lines().enumerate() {
        if fence.skip(line) {
            continue;
        }
        out.extend(links_in_line(line, idx + 1));
    }

    out
}

fn links_in_line(line: &str, line_no: usize) -> Vec<RawLink> {
    let bytes = line.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'[' {
            i += 1;
            continue;
        }
        let Some(label_end) = find_byte(bytes, b']', i + 1) else {
            break;
        };
        if label_end == i + 1 || bytes.get(label_end + 1) != Some(&b'(') {
            i = label_end + 1;
            continue;
        }
        let Some(target_end) = find_byte(bytes, b')', label_end + 2) else {
            break;
        };

        let target = clean_target(&line[label_end + 2..target_end]);
        if !target.is_empty() {
            out.push(RawLink {
                text: line[i + 1..label_end].to_string(),
                target,
                line: line_no,
                is_image: i > 0 && bytes[i - 1] == b'!',
            });
        }
        i = target_end + 1;
    }

    out
}

fn clean_target(raw: &str) -> String {
    let mut target = raw.trim();
    if let Some(inner) = target.strip_prefix('<').and_then(|t| t.split_once('>')) {
        return inner.0.trim().to_string();
    }
    if let Some((before, _title)) = target.split_once(char::is_whitespace) {
        target = before;
    }
    target.to_string()
}

fn find_byte(bytes: &[u8], target: u8, start: usize) -> Option<usize> {
    bytes
        .get(start..)?
        .iter()
        .position(|b| *b == target)
        .map(|offset| start + offset)
}
