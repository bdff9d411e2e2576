//! Domain types shared across modules.
//!
//! These are the value objects that flow between the workspace scanner,
//! ranker, prompt assembler, budget gate and stream decoder. Keeping them
//! here avoids circular dependencies between those modules.

use serde::{Deserialize, Serialize};

/// A path found by the workspace walk, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Workspace-relative path with `/` separators
    pub path: String,
    pub raw_size: u64,
}

/// A file selected for the prompt.
///
/// `score` is only present in focused (ranked) mode.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadableFile {
    pub path: String,
    pub content: String,
    pub score: Option<f32>,
}

impl UploadableFile {
    pub fn unranked(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            score: None,
        }
    }
}

/// One file extracted from a model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBlock {
    pub filename: String,
    pub contents: String,
}

impl FileBlock {
    pub fn new(filename: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            contents: contents.into(),
        }
    }
}

/// What the model is asked to do with the codebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// Build features and return changed files
    #[default]
    Implement,
    /// Answer a question without implementing anything
    Question,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Implement => "implement",
            Mode::Question => "question",
        }
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A typed content block. Text and image blocks can be interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text(String),
    /// Image reference, usually a `data:image/...;base64,` URL
    Image(String),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text(text.into())
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![ContentBlock::text(text)])
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentBlock::text(text)])
    }

    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text(t) => Some(t.as_str()),
                ContentBlock::Image(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_text_skips_images() {
        let message = Message::new(
            Role::User,
            vec![
                ContentBlock::text("hello "),
                ContentBlock::Image("data:image/png;base64,AAAA".to_string()),
                ContentBlock::text("world"),
            ],
        );
        assert_eq!(message.text(), "hello world");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }
}
