//! Live terminal view of a streaming response.

use crate::stream::decoder::{LineKind, RenderSink, RenderedLine};
use colored::Colorize;
use std::io::Write;

const OUTPUT_PADDING: &str = "    ";
const HEADER_WIDTH: usize = 60;
const FOOTER_WIDTH: usize = 58;
const LANGUAGE_COLUMN: usize = 66;

/// `═ 📄 src/main.rs ════...`
pub fn header_text(filename: &str) -> String {
    let width = HEADER_WIDTH.saturating_sub(filename.chars().count());
    format!("═ 📄 {} {}", filename, "═".repeat(width))
}

/// `═ EOF: src/main.rs ════...`
pub fn footer_text(filename: &str) -> String {
    let width = FOOTER_WIDTH.saturating_sub(filename.chars().count());
    format!("═ EOF: {} {}", filename, "═".repeat(width))
}

/// Language tag right-aligned under the header rule.
pub fn language_text(language: &str) -> String {
    let pad = LANGUAGE_COLUMN.saturating_sub(language.chars().count());
    format!("{}{}", " ".repeat(pad), language)
}

fn is_comment(line: &str, language: Option<&str>) -> bool {
    let trimmed = line.trim_start();
    match language {
        Some("python" | "bash" | "ruby" | "yaml" | "toml" | "dockerfile" | "make") => {
            trimmed.starts_with('#')
        }
        Some("sql" | "lua" | "haskell") => trimmed.starts_with("--"),
        Some("plain" | "markdown") | None => false,
        Some(_) => trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*'),
    }
}

/// Plain text of a rendered line, padded, without colour.
pub fn plain_text(line: &RenderedLine) -> String {
    match line.kind {
        LineKind::FileHeader => format!("\n{}{}", OUTPUT_PADDING, header_text(&line.text)),
        LineKind::FileFooter => format!("{}{}\n", OUTPUT_PADDING, footer_text(&line.text)),
        LineKind::FenceOpen => match &line.language {
            Some(language) => format!("{}{}", OUTPUT_PADDING, language_text(language)),
            None => format!("{}{}", OUTPUT_PADDING, line.text),
        },
        _ => format!("{}{}", OUTPUT_PADDING, line.text),
    }
}

/// Writes coloured lines to a terminal (or any writer).
pub struct TerminalView<W: Write> {
    out: W,
    received_chars: usize,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            received_chars: 0,
        }
    }

    /// Characters of rendered line text seen so far.
    pub fn received_chars(&self) -> usize {
        self.received_chars
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&self, line: &RenderedLine) -> String {
        let text = plain_text(line);
        match line.kind {
            LineKind::FileHeader | LineKind::FileFooter => text.bright_magenta().to_string(),
            LineKind::FenceOpen | LineKind::FenceClose => text.dimmed().to_string(),
            LineKind::Code if is_comment(&line.text, line.language.as_deref()) => {
                text.bright_black().to_string()
            }
            LineKind::Code => text.yellow().to_string(),
            LineKind::Text => text.bright_blue().to_string(),
        }
    }
}

impl<W: Write> RenderSink for TerminalView<W> {
    fn render(&mut self, line: &RenderedLine) {
        self.received_chars += line.text.chars().count();
        let styled = self.styled(line);
        // Write errors on the view are ignored
        let _ = writeln!(self.out, "{}", styled);
        let _ = self.out.flush();
    }

    fn finish(&mut self) {
        let _ = self.out.flush();
    }
}
