//! Changeset delimiter grammar.
//!
//! ```text
//! ===.= ==== FILENAME: <path> = ===== =========
//! ```python
//! ...
//! ```
//! ===.= ==== EOF: <path> = ===== =========
//! ```
//!
//! Rendering is bit-exact. Parsing compares the `=` runs with whitespace
//! removed, so models that shift a space inside the runs still match.

/// Literal prefix of both markers.
pub const MARKER_PREFIX: &str = "===.= ==== ";
/// Literal suffix of both markers.
pub const MARKER_SUFFIX: &str = " = ===== =========";

pub const START_KEYWORD: &str = "FILENAME:";
pub const END_KEYWORD: &str = "EOF:";

pub const FENCE: &str = "```";

/// Prefix and suffix with all whitespace removed.
const PREFIX_COMPACT: &str = "===.=====";
const SUFFIX_COMPACT: &str = "===============";

/// A recognised delimiter line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Start(String),
    End(String),
}

pub fn render_start(filename: &str) -> String {
    format!("{}{} {}{}", MARKER_PREFIX, START_KEYWORD, filename, MARKER_SUFFIX)
}

pub fn render_end(filename: &str) -> String {
    format!("{}{} {}{}", MARKER_PREFIX, END_KEYWORD, filename, MARKER_SUFFIX)
}

fn compact(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Drop the trailing suffix: exactly its `=` count, spaces allowed anywhere
/// inside, and whitespace before it. A filename may itself end in `=`.
fn strip_suffix(rest: &str) -> Option<&str> {
    let mut equals = 0;
    for (i, c) in rest.char_indices().rev() {
        if c == '=' {
            equals += 1;
            if equals == SUFFIX_COMPACT.len() {
                let head = &rest[..i];
                return head.ends_with(char::is_whitespace).then_some(head);
            }
        } else if !c.is_whitespace() {
            return None;
        }
    }
    None
}

/// Parse a single line (without its newline) as a marker.
pub fn parse_marker(line: &str) -> Option<Marker> {
    let line = line.trim();
    if !line.starts_with('=') {
        return None;
    }

    let (keyword_at, keyword, is_start) = match (line.find(START_KEYWORD), line.find(END_KEYWORD)) {
        (Some(s), Some(e)) if e < s => (e, END_KEYWORD, false),
        (Some(s), _) => (s, START_KEYWORD, true),
        (None, Some(e)) => (e, END_KEYWORD, false),
        (None, None) => return None,
    };

    if compact(&line[..keyword_at]) != PREFIX_COMPACT {
        return None;
    }

    let rest = &line[keyword_at + keyword.len()..];
    let filename = strip_suffix(rest)?.trim();
    if filename.is_empty() {
        return None;
    }

    let filename = filename.to_string();
    Some(if is_start {
        Marker::Start(filename)
    } else {
        Marker::End(filename)
    })
}

/// If `line` opens or closes a fence, the language tag after the backticks.
/// `Some("")` for a bare fence.
pub fn fence_language(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix(FENCE).map(str::trim)
}
