//! Provider request/response types and the provider error taxonomy.
//!
//! Chat requests use the OpenAI chat-completions shape (also served by
//! Azure and Gemini's OpenAI-compatible endpoint); Anthropic gets its own
//! messages shape.

use crate::domain::{ContentBlock, Message, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by an embedding or completion provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed provider payload: {0}")]
    Malformed(String),

    #[error("Provider stream error: {0}")]
    Stream(String),
}

impl ProviderError {
    pub fn from_status(status: u16, body: String) -> Self {
        // Prefer the provider's own message when the body is a JSON error
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .map(|e| e.error.message)
            .unwrap_or(body);
        ProviderError::Http { status, message }
    }

    /// Authentication problems are worth a distinct hint to the user.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ProviderError::Http { status: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

// ============================================================================
// OpenAI-compatible chat completions
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ChatContent {
    Text(String),
    Parts(Vec<ChatContentPart>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: ChatContent,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        let only_text = message
            .content
            .iter()
            .all(|block| matches!(block, ContentBlock::Text(_)));

        let content = if only_text {
            ChatContent::Text(message.text())
        } else {
            ChatContent::Parts(
                message
                    .content
                    .iter()
                    .map(|block| match block {
                        ContentBlock::Text(text) => ChatContentPart::Text { text: text.clone() },
                        ContentBlock::Image(url) => ChatContentPart::ImageUrl {
                            image_url: ImageUrl { url: url.clone() },
                        },
                    })
                    .collect(),
            )
        };

        Self {
            role: message.role,
            content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    pub fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
    }
}

// ============================================================================
// Anthropic messages
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicContentPart {
    Text { text: String },
    Image { source: AnthropicImageSource },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnthropicImageSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnthropicMessage {
    pub role: Role,
    pub content: Vec<AnthropicContentPart>,
}

#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<AnthropicMessage>,
    pub max_tokens: u32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Split a `data:<media>;base64,<data>` URL.
pub fn split_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (media_type, data) = rest.split_once(";base64,")?;
    Some((media_type, data))
}

impl AnthropicRequest {
    /// System messages move to the top-level `system` field.
    pub fn from_messages(
        model: &str,
        messages: &[Message],
        max_tokens: u32,
        temperature: Option<f32>,
    ) -> Self {
        let system: Vec<String> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(Message::text)
            .collect();

        let converted = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| AnthropicMessage {
                role: m.role,
                content: m
                    .content
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text(text) => Some(AnthropicContentPart::Text { text: text.clone() }),
                        ContentBlock::Image(url) => {
                            split_data_url(url).map(|(media_type, data)| AnthropicContentPart::Image {
                                source: AnthropicImageSource {
                                    source_type: "base64".to_string(),
                                    media_type: media_type.to_string(),
                                    data: data.to_string(),
                                },
                            })
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            model: model.to_string(),
            system: if system.is_empty() {
                None
            } else {
                Some(system.join("\n"))
            },
            messages: converted,
            max_tokens,
            stream: true,
            temperature,
        }
    }
}

/// The subset of Anthropic stream events we act on.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicEvent {
    ContentBlockDelta { delta: AnthropicDelta },
    MessageStop,
    Error { error: ErrorBody },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicDelta {
    #[serde(default)]
    pub text: Option<String>,
}

// ============================================================================
// Embeddings
// ============================================================================

#[derive(Debug, Serialize)]
pub struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a [String],
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub index: usize,
}

impl EmbeddingResponse {
    /// Vectors in input order.
    pub fn into_vectors(mut self, expected: usize) -> Result<Vec<Vec<f32>>, ProviderError> {
        if self.data.len() != expected {
            return Err(ProviderError::Malformed(format!(
                "expected {} embeddings, got {}",
                expected,
                self.data.len()
            )));
        }
        self.data.sort_by_key(|d| d.index);
        Ok(self.data.into_iter().map(|d| d.embedding).collect())
    }
}
