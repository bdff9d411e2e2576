//! Authoritative changeset extraction over a complete response.

use crate::domain::FileBlock;
use crate::stream::protocol::{fence_language, parse_marker, Marker, FENCE};
#[cfg(test)]
use crate::stream::protocol::{render_end, render_start};

const ESTIMATE_HEADER: &str = "## ESTIMATED CHARACTERS:";

/// Extract every balanced `FILENAME`/`EOF` block, in encounter order.
///
/// A start marker for `F` pairs with the next end marker for the same `F`.
/// Start markers with no matching end are dropped. Duplicate filenames
/// produce separate entries.
pub fn extract(text: &str) -> Vec<FileBlock> {
    let lines: Vec<&str> = text.lines().collect();
    let markers: Vec<Option<Marker>> = lines.iter().map(|line| parse_marker(line)).collect();

    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(Marker::Start(filename)) = &markers[i] else {
            i += 1;
            continue;
        };

        let close = (i + 1..lines.len())
            .find(|&j| matches!(&markers[j], Some(Marker::End(f)) if f == filename));

        match close {
            Some(j) => {
                blocks.push(FileBlock::new(filename.clone(), block_contents(&lines[i + 1..j])));
                i = j + 1;
            }
            None => i += 1,
        }
    }
    blocks
}

/// Body between the markers, with one paired fence stripped and edges trimmed.
fn block_contents(body: &[&str]) -> String {
    let mut start = 0;
    let mut end = body.len();

    // Skip blank lines so a fence after an empty line is still recognised
    while start < end && body[start].trim().is_empty() {
        start += 1;
    }
    while end > start && body[end - 1].trim().is_empty() {
        end -= 1;
    }

    if start < end && fence_language(body[start]).is_some() {
        start += 1;
        if end > start && body[end - 1].trim() == FENCE {
            end -= 1;
        }
    }

    body[start..end].join("\n").trim().to_string()
}

/// True when the text has more start markers than end markers.
pub fn is_mid_file(text: &str) -> bool {
    let mut starts = 0usize;
    let mut ends = 0usize;
    for line in text.lines() {
        match parse_marker(line) {
            Some(Marker::Start(_)) => starts += 1,
            Some(Marker::End(_)) => ends += 1,
            None => {}
        }
    }
    starts > ends
}

/// The model's own size estimate from the `## ESTIMATED CHARACTERS:` header.
pub fn estimated_characters(text: &str) -> Option<usize> {
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        if line.trim() == ESTIMATE_HEADER {
            let value = lines.next()?.trim();
            let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
            return digits.parse().ok();
        }
    }
    None
}

/// Emit blocks in the wire format, always fenced.
#[cfg(test)]
pub fn render(blocks: &[FileBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        out.push_str(&render_start(&block.filename));
        out.push('\n');
        out.push_str(FENCE);
        out.push('\n');
        out.push_str(&block.contents);
        out.push('\n');
        out.push_str(FENCE);
        out.push('\n');
        out.push_str(&render_end(&block.filename));
        out.push('\n');
    }
    out
}
