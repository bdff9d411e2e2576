//! Text embeddings.
//!
//! Chunk texts are sent in batches bounded by both item count and total
//! byte size, sequentially, one request per batch.

use async_trait::async_trait;
use tracing::debug;

use super::client::ApiClient;
use super::types::{EmbeddingRequest, EmbeddingResponse, ProviderError};

/// Maximum texts per embedding request
pub const MAX_EMBEDDING_BATCH_COUNT: usize = 128;

/// Maximum total bytes per embedding request
pub const MAX_EMBEDDING_BATCH_BYTES: usize = 1_000_000;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model name, used as the cache namespace.
    fn model(&self) -> &str;

    /// One vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed(&[query.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ProviderError::Malformed("empty embedding response".to_string()))
    }
}

/// Split texts into index ranges by item count and byte size.
///
/// A batch is closed before an item that would reach either limit; an
/// oversized single item still gets a batch of its own.
pub fn create_embedding_batches(texts: &[String]) -> Vec<std::ops::Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut current_bytes = 0usize;

    for (i, text) in texts.iter().enumerate() {
        let size = text.len();
        let would_exceed_count = i - start >= MAX_EMBEDDING_BATCH_COUNT;
        let would_exceed_bytes = current_bytes + size >= MAX_EMBEDDING_BATCH_BYTES;

        if (would_exceed_count || would_exceed_bytes) && i > start {
            batches.push(start..i);
            start = i;
            current_bytes = 0;
        }
        current_bytes += size;
    }

    if start < texts.len() {
        batches.push(start..texts.len());
    }
    batches
}

/// OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbeddingProvider {
    client: ApiClient,
    model: String,
    endpoint: String,
}

impl HttpEmbeddingProvider {
    /// `endpoint` comes from `Credentials::embeddings_endpoint`.
    pub fn new(client: ApiClient, model: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let mut vectors = Vec::with_capacity(texts.len());
        let batches = create_embedding_batches(texts);
        let total = batches.len();

        for (n, range) in batches.into_iter().enumerate() {
            let batch = &texts[range];
            debug!("Embedding batch {}/{} ({} texts)", n + 1, total, batch.len());

            let request = EmbeddingRequest {
                model: &self.model,
                input: batch,
            };
            let response: EmbeddingResponse = self.client.call_json(&self.endpoint, &request).await?;
            vectors.extend(response.into_vectors(batch.len())?);
        }

        Ok(vectors)
    }
}
