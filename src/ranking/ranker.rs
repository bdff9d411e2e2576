//! Focused file selection by semantic relevance.

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::api::EmbeddingProvider;
use crate::domain::UploadableFile;
use crate::ranking::cache::{CacheStore, CachedDocument, EmbeddingBundle, EmbeddingCache};
use crate::ranking::chunker::{chunk_files, Chunk};
use crate::ranking::index::{InMemoryIndex, VectorIndex};
use crate::workspace::{directory_checksum, scan_workspace, UploadFilter};

pub struct RelevanceRanker<'a> {
    embedder: &'a dyn EmbeddingProvider,
    store: &'a dyn CacheStore,
}

impl<'a> RelevanceRanker<'a> {
    pub fn new(embedder: &'a dyn EmbeddingProvider, store: &'a dyn CacheStore) -> Self {
        Self { embedder, store }
    }

    /// Walk the filtered workspace and return the `top_n` most relevant chunks.
    pub async fn rank(
        &self,
        filter: &UploadFilter,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<UploadableFile>> {
        let files = scan_workspace(filter);
        self.rank_files(filter.root(), &files, query, top_n).await
    }

    /// Rank already-read files.
    ///
    /// Each selected chunk yields its source file's full current content with
    /// the chunk score, so a file can appear more than once.
    pub async fn rank_files(
        &self,
        root: &Path,
        files: &[UploadableFile],
        query: &str,
        top_n: usize,
    ) -> Result<Vec<UploadableFile>> {
        let cache = EmbeddingCache::new(self.store, self.embedder.model());
        let checksum = directory_checksum(files);

        let entries = match cache.load(&checksum) {
            Some(bundle) => {
                debug!("Reusing {} cached chunk embeddings", bundle.documents.len());
                from_bundle(bundle)
            }
            None => self.embed_chunks(&cache, &checksum, files).await?,
        };

        let query_vector = match cache.query_vector(query) {
            Some(vector) => vector,
            None => {
                let vector = self
                    .embedder
                    .embed_query(query)
                    .await
                    .context("Failed to embed query")?;
                if let Err(e) = cache.save_query_vector(query, &vector) {
                    warn!("{:#}", e);
                }
                vector
            }
        };

        let mut index = InMemoryIndex::new();
        index.index(entries);
        let hits = index.query(&query_vector, top_n);
        debug!("Selected {} of {} chunks", hits.len(), index.len());

        let mut ranked = Vec::with_capacity(hits.len());
        for hit in hits {
            match read_source(root, &hit.chunk.source) {
                Some(content) => ranked.push(UploadableFile {
                    path: hit.chunk.source,
                    content,
                    score: Some(hit.score),
                }),
                None => warn!("Skipping {}: no longer readable", hit.chunk.source),
            }
        }
        Ok(ranked)
    }

    async fn embed_chunks(
        &self,
        cache: &EmbeddingCache<'_>,
        checksum: &str,
        files: &[UploadableFile],
    ) -> Result<Vec<(Chunk, Vec<f32>)>> {
        let chunks = chunk_files(files);
        info!(
            "Embedding {} chunks from {} files with {}",
            chunks.len(),
            files.len(),
            self.embedder.model()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder
                .embed(&texts)
                .await
                .context("Failed to embed workspace chunks")?
        };

        if vectors.len() != chunks.len() {
            anyhow::bail!(
                "Embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            );
        }

        let bundle = EmbeddingBundle {
            checksum: checksum.to_string(),
            model: self.embedder.model().to_string(),
            created_at: Utc::now(),
            documents: chunks
                .iter()
                .map(|c| CachedDocument {
                    text: c.text.clone(),
                    source: c.source.clone(),
                    file_index: c.file_index,
                })
                .collect(),
            vectors: vectors.clone(),
        };
        // Cache write failures are not fatal
        if let Err(e) = cache.save(&bundle) {
            warn!("{:#}", e);
        }

        Ok(chunks.into_iter().zip(vectors).collect())
    }
}

fn from_bundle(bundle: EmbeddingBundle) -> Vec<(Chunk, Vec<f32>)> {
    bundle
        .documents
        .into_iter()
        .map(|doc| Chunk {
            source: doc.source,
            file_index: doc.file_index,
            text: doc.text,
        })
        .zip(bundle.vectors)
        .collect()
}

fn read_source(root: &Path, relative: &str) -> Option<String> {
    match fs::read(root.join(relative)) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!("Failed to re-read {}: {}", relative, e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use crate::api::{EmbeddingProvider, ProviderError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder: counts keyword occurrences.
    pub struct KeywordEmbedder {
        pub keywords: Vec<&'static str>,
        pub calls: AtomicUsize,
        pub texts_embedded: AtomicUsize,
        pub fail: bool,
    }

    impl KeywordEmbedder {
        pub fn new(keywords: &[&'static str]) -> Self {
            Self {
                keywords: keywords.to_vec(),
                calls: AtomicUsize::new(0),
                texts_embedded: AtomicUsize::new(0),
                fail: false,
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn model(&self) -> &str {
            "test/keywords"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Http {
                    status: 500,
                    message: "embedding backend down".to_string(),
                });
            }
            self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    self.keywords
                        .iter()
                        .map(|k| t.matches(k).count() as f32)
                        .collect()
                })
                .collect())
        }
    }
}
