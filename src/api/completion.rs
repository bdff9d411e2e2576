//! Streaming chat completions.
//!
//! The provider returns a stream of text fragments. Server-sent events are
//! split into lines with the same buffer-and-scan approach for every
//! provider; only the payload decoding differs.

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use tracing::{debug, warn};

use super::client::{ApiClient, STREAM_TIMEOUT_SECS};
use super::types::{
    AnthropicEvent, AnthropicRequest, ChatCompletionChunk, ChatCompletionRequest, ChatMessage,
    ProviderError,
};
use crate::credentials::Provider;
use crate::domain::Message;

/// Fragments of model output, in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Anthropic requires an explicit output limit.
pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 4096;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Start a streaming completion. Errors before the first fragment are
    /// returned directly; later ones arrive inside the stream.
    async fn complete(&self, messages: &[Message]) -> Result<FragmentStream, ProviderError>;
}

#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// One decoded SSE line.
#[derive(Debug, PartialEq)]
pub enum SseEvent {
    Fragment(String),
    Done,
    Skip,
}

/// Decode one line of an OpenAI-compatible stream.
pub fn parse_openai_line(line: &str) -> Result<SseEvent, ProviderError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Skip);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(SseEvent::Skip);
    }
    if data == "[DONE]" {
        return Ok(SseEvent::Done);
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(data) {
        if let Some(message) = value.pointer("/error/message").and_then(|m| m.as_str()) {
            return Err(ProviderError::Stream(message.to_string()));
        }
    }

    let chunk: ChatCompletionChunk =
        serde_json::from_str(data).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    Ok(match chunk.into_content() {
        Some(text) if !text.is_empty() => SseEvent::Fragment(text),
        _ => SseEvent::Skip,
    })
}

/// Decode one line of an Anthropic messages stream.
pub fn parse_anthropic_line(line: &str) -> Result<SseEvent, ProviderError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseEvent::Skip);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(SseEvent::Skip);
    }

    let event: AnthropicEvent =
        serde_json::from_str(data).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    match event {
        AnthropicEvent::ContentBlockDelta { delta } => Ok(match delta.text {
            Some(text) if !text.is_empty() => SseEvent::Fragment(text),
            _ => SseEvent::Skip,
        }),
        AnthropicEvent::MessageStop => Ok(SseEvent::Done),
        AnthropicEvent::Error { error } => Err(ProviderError::Stream(error.message)),
        AnthropicEvent::Other => Ok(SseEvent::Skip),
    }
}

type LineParser = fn(&str) -> Result<SseEvent, ProviderError>;

/// Turn a stream of byte chunks into text fragments.
///
/// Only complete lines are decoded; the remainder is carried forward. The
/// stream ends at the first error.
pub fn sse_fragments<S, B, E>(bytes: S, parse: LineParser) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ProviderError> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut buffer: Vec<u8> = Vec::new();

        'outer: while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    yield Err(e.into());
                    break 'outer;
                }
            };
            buffer.extend_from_slice(chunk.as_ref());

            // Decode whole lines only; a chunk may end inside a UTF-8 sequence
            while let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=newline_pos).collect();
                let line = String::from_utf8_lossy(&raw);
                match parse(line.trim()) {
                    Ok(SseEvent::Fragment(text)) => yield Ok(text),
                    Ok(SseEvent::Done) => break 'outer,
                    Ok(SseEvent::Skip) => {}
                    Err(e) => {
                        yield Err(e);
                        break 'outer;
                    }
                }
            }
        }

        // Process any remaining data in buffer
        let rest = String::from_utf8_lossy(&buffer).into_owned();
        if !rest.trim().is_empty() {
            if let Ok(SseEvent::Fragment(text)) = parse(rest.trim()) {
                yield Ok(text);
            }
        }
    };
    Box::pin(stream)
}

/// Completion provider over HTTP.
pub struct HttpCompletionProvider {
    client: ApiClient,
    model: String,
    options: CompletionOptions,
}

impl HttpCompletionProvider {
    /// `model` is the provider-side name, without the `provider/` prefix.
    pub fn new(client: ApiClient, model: impl Into<String>, options: CompletionOptions) -> Self {
        Self {
            client,
            model: model.into(),
            options,
        }
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, messages: &[Message]) -> Result<FragmentStream, ProviderError> {
        let credentials = self.client.credentials();
        let endpoint = credentials.chat_endpoint(&self.model);

        debug!("=== Completion Request ===");
        debug!("Model: {} ({} messages)", self.model, messages.len());

        let (response, parser): (reqwest::Response, LineParser) = match credentials.provider {
            Provider::Anthropic => {
                let body = AnthropicRequest::from_messages(
                    &self.model,
                    messages,
                    self.options.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
                    self.options.temperature,
                );
                let response = self
                    .client
                    .post_json(&endpoint, &body, STREAM_TIMEOUT_SECS)
                    .await?;
                (response, parse_anthropic_line)
            }
            Provider::OpenAi | Provider::Gemini | Provider::Azure => {
                let body = ChatCompletionRequest {
                    model: self.model.clone(),
                    messages: messages.iter().map(ChatMessage::from).collect(),
                    stream: true,
                    max_tokens: self.options.max_tokens,
                    temperature: self.options.temperature,
                };
                let response = self
                    .client
                    .post_json(&endpoint, &body, STREAM_TIMEOUT_SECS)
                    .await?;
                (response, parse_openai_line)
            }
        };

        if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE) {
            if !content_type.to_str().unwrap_or_default().contains("event-stream") {
                warn!("Unexpected content type for a stream: {:?}", content_type);
            }
        }

        Ok(sse_fragments(response.bytes_stream(), parser))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    async fn collect(stream: FragmentStream) -> Vec<Result<String, String>> {
        stream
            .map(|item| item.map_err(|e| e.to_string()))
            .collect()
            .await
    }

    #[test]
    fn test_parse_openai_line() {
        assert_eq!(
            parse_openai_line(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#).unwrap(),
            SseEvent::Fragment("Hi".to_string())
        );
        assert_eq!(parse_openai_line("data: [DONE]").unwrap(), SseEvent::Done);
        assert_eq!(parse_openai_line(": keep-alive").unwrap(), SseEvent::Skip);
        assert_eq!(parse_openai_line("").unwrap(), SseEvent::Skip);
        assert!(matches!(
            parse_openai_line(r#"data: {"error":{"message":"overloaded"}}"#),
            Err(ProviderError::Stream(m)) if m == "overloaded"
        ));
        assert!(matches!(
            parse_openai_line("data: {broken"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_anthropic_line() {
        assert_eq!(
            parse_anthropic_line(
                r#"data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Yo"}}"#
            )
            .unwrap(),
            SseEvent::Fragment("Yo".to_string())
        );
        assert_eq!(
            parse_anthropic_line(r#"data: {"type":"message_stop"}"#).unwrap(),
            SseEvent::Done
        );
        assert_eq!(parse_anthropic_line("event: ping").unwrap(), SseEvent::Skip);
    }

    #[tokio::test]
    async fn test_sse_lines_split_across_chunks() {
        let chunks: Vec<Result<Vec<u8>, ProviderError>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"He".to_vec()),
            Ok(b"llo\"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n".to_vec()),
            Ok(b"data: [DONE]\n".to_vec()),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n".to_vec()),
        ];
        let fragments = collect(sse_fragments(stream::iter(chunks), parse_openai_line)).await;
        assert_eq!(
            fragments,
            vec![Ok("Hello".to_string()), Ok(" world".to_string())]
        );
    }

    #[tokio::test]
    async fn test_sse_transport_error_ends_stream() {
        let chunks: Vec<Result<Vec<u8>, ProviderError>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n".to_vec()),
            Err(ProviderError::Transport("connection reset".to_string())),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n".to_vec()),
        ];
        let fragments = collect(sse_fragments(stream::iter(chunks), parse_openai_line)).await;
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0], Ok("partial".to_string()));
        assert!(fragments[1].as_ref().unwrap_err().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_sse_multibyte_char_split_across_chunks() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"café\"}}]}\n".as_bytes();
        // Split between the two bytes of 'é'
        let split = line.iter().position(|b| *b == 0xc3).unwrap() + 1;
        let chunks: Vec<Result<Vec<u8>, ProviderError>> =
            vec![Ok(line[..split].to_vec()), Ok(line[split..].to_vec())];
        let fragments = collect(sse_fragments(stream::iter(chunks), parse_openai_line)).await;
        assert_eq!(fragments, vec![Ok("café".to_string())]);
    }

    #[tokio::test]
    async fn test_sse_trailing_multibyte_without_newline() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"naïve\"}}]}".as_bytes();
        let split = line.iter().position(|b| *b == 0xc3).unwrap() + 1;
        let chunks: Vec<Result<Vec<u8>, ProviderError>> =
            vec![Ok(line[..split].to_vec()), Ok(line[split..].to_vec())];
        let fragments = collect(sse_fragments(stream::iter(chunks), parse_openai_line)).await;
        assert_eq!(fragments, vec![Ok("naïve".to_string())]);
    }

    #[tokio::test]
    async fn test_sse_trailing_line_without_newline() {
        let chunks: Vec<Result<Vec<u8>, ProviderError>> =
            vec![Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}".to_vec())];
        let fragments = collect(sse_fragments(stream::iter(chunks), parse_openai_line)).await;
        assert_eq!(fragments, vec![Ok("tail".to_string())]);
    }
}
