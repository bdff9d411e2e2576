//! Model provider clients.
//!
//! HTTP plumbing (retries, headers, URL building) lives in `client` and
//! `http`; the two provider seams the core depends on are the
//! `EmbeddingProvider` and `CompletionProvider` traits.

mod client;
pub mod completion;
pub mod embeddings;
mod http;
pub mod types;

pub use client::ApiClient;
pub use completion::{CompletionOptions, CompletionProvider, HttpCompletionProvider};
pub use embeddings::{EmbeddingProvider, HttpEmbeddingProvider};
pub use types::ProviderError;
