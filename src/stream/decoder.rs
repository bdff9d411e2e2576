//! Incremental decoder for streamed changesets.
//!
//! Fragments arrive at arbitrary byte boundaries. The decoder keeps the
//! trailing partial line in `pending` and only classifies complete lines,
//! so a marker split across two fragments is never matched half-way.
//! All raw text is kept in `accumulated` for the extractor.

use crate::stream::protocol::{fence_language, parse_marker, Marker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    OutsideFile,
    /// Just saw a start marker; the next line may open a fence.
    InsideFileHeader,
    InsideFileBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Prose outside any file block
    Text,
    /// Start marker; `text` is the filename
    FileHeader,
    /// End marker; `text` is the filename
    FileFooter,
    /// Opening fence; `language` holds the declared tag
    FenceOpen,
    FenceClose,
    /// A line of file content
    Code,
}

/// A line ready for display, with highlighting metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub kind: LineKind,
    pub text: String,
    pub language: Option<String>,
}

impl RenderedLine {
    fn new(kind: LineKind, text: impl Into<String>, language: Option<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            language,
        }
    }
}

/// Receives rendered lines as they are decoded.
pub trait RenderSink {
    fn render(&mut self, line: &RenderedLine);

    /// Called once after the last line.
    fn finish(&mut self) {}
}

/// Collects lines in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub lines: Vec<RenderedLine>,
    pub finished: bool,
}

#[cfg(test)]
impl RenderSink for CollectingSink {
    fn render(&mut self, line: &RenderedLine) {
        self.lines.push(line.clone());
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

/// Map fence tags to the names the highlighter knows.
fn normalize_language(tag: &str) -> Option<String> {
    let tag = tag.trim().to_ascii_lowercase();
    match tag.as_str() {
        "" => None,
        "plaintext" | "text" | "txt" => Some("plain".to_string()),
        "tsx" | "ts" => Some("typescript".to_string()),
        "jsx" | "js" => Some("javascript".to_string()),
        "py" => Some("python".to_string()),
        "rs" => Some("rust".to_string()),
        "sh" | "shell" | "zsh" => Some("bash".to_string()),
        _ => Some(tag),
    }
}

#[derive(Debug)]
pub struct StreamDecoder {
    pending: String,
    accumulated: String,
    language: Option<String>,
    state: DecoderState,
    start_markers: usize,
    end_markers: usize,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            pending: String::new(),
            accumulated: String::new(),
            language: None,
            state: DecoderState::OutsideFile,
            start_markers: 0,
            end_markers: 0,
        }
    }

    /// Feed one fragment; returns the lines it completed.
    pub fn push(&mut self, fragment: &str) -> Vec<RenderedLine> {
        self.accumulated.push_str(fragment);
        self.pending.push_str(fragment);

        let mut lines = Vec::new();
        while let Some(newline) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=newline).collect();
            let line = line.trim_end_matches('\n').trim_end_matches('\r');
            lines.push(self.process_line(line));
        }
        lines
    }

    /// Flush the trailing partial line once the stream has ended.
    pub fn finish(&mut self) -> Vec<RenderedLine> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let line = std::mem::take(&mut self.pending);
        let line = line.trim_end_matches('\r');
        vec![self.process_line(line)]
    }

    fn process_line(&mut self, line: &str) -> RenderedLine {
        match parse_marker(line) {
            Some(Marker::Start(filename)) => {
                // A missing EOF before this start is tolerated here
                self.state = DecoderState::InsideFileHeader;
                self.language = None;
                self.start_markers += 1;
                return RenderedLine::new(LineKind::FileHeader, filename, None);
            }
            Some(Marker::End(filename)) => {
                self.state = DecoderState::OutsideFile;
                self.language = None;
                self.end_markers += 1;
                return RenderedLine::new(LineKind::FileFooter, filename, None);
            }
            None => {}
        }

        match self.state {
            DecoderState::OutsideFile => RenderedLine::new(LineKind::Text, line, None),
            DecoderState::InsideFileHeader => {
                self.state = DecoderState::InsideFileBody;
                match fence_language(line) {
                    Some(tag) => {
                        self.language = normalize_language(tag);
                        RenderedLine::new(LineKind::FenceOpen, line, self.language.clone())
                    }
                    None => RenderedLine::new(LineKind::Code, line, None),
                }
            }
            DecoderState::InsideFileBody => {
                if fence_language(line).is_some() {
                    RenderedLine::new(LineKind::FenceClose, line, self.language.clone())
                } else {
                    RenderedLine::new(LineKind::Code, line, self.language.clone())
                }
            }
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> DecoderState {
        self.state
    }

    #[cfg(test)]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// The incomplete trailing line not yet classified.
    #[cfg(test)]
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Every fragment received so far, verbatim.
    #[cfg(test)]
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    pub fn into_text(self) -> String {
        self.accumulated
    }

    /// True while more start markers than end markers have been decoded.
    pub fn is_mid_file(&self) -> bool {
        self.start_markers > self.end_markers
    }
}
