//! Embedding cache.
//!
//! A `CacheStore` is a byte store addressed by (namespace, key). The
//! `EmbeddingCache` keeps one checksum record and one bundle per workspace in
//! it, plus query vectors keyed by the query hash.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::workspace::checksum::hash_text;

/// Cache directory created under the workspace root.
pub const CACHE_DIR_NAME: &str = ".arcode.embeddings";

const CHECKSUM_KEY: &str = "checksum";

pub trait CacheStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> io::Result<Option<Vec<u8>>>;
    fn put(&self, namespace: &str, key: &str, value: &[u8]) -> io::Result<()>;
    fn remove(&self, namespace: &str, key: &str) -> io::Result<()>;
}

/// Replace anything that is not safe in a file name.
fn safe_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

/// One file per entry: `<root>/<namespace>/<key>`.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    root: PathBuf,
}

impl FileCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `<workspace>/.arcode.embeddings`.
    pub fn for_workspace(workspace_root: &Path) -> Self {
        Self::new(workspace_root.join(CACHE_DIR_NAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.root
            .join(safe_component(namespace))
            .join(safe_component(key))
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, namespace: &str, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.entry_path(namespace, key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put(&self, namespace: &str, key: &str, value: &[u8]) -> io::Result<()> {
        let path = self.entry_path(namespace, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write to a sibling then rename so readers never see half an entry
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)
    }

    fn remove(&self, namespace: &str, key: &str) -> io::Result<()> {
        match fs::remove_file(self.entry_path(namespace, key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Store kept in memory, used by tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<(String, String), Vec<u8>>>,
}

#[cfg(test)]
impl MemoryCacheStore {
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<(String, String), Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "cache lock poisoned"))
    }
}

#[cfg(test)]
impl CacheStore for MemoryCacheStore {
    fn get(&self, namespace: &str, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self
            .lock()?
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: &[u8]) -> io::Result<()> {
        self.lock()?
            .insert((namespace.to_string(), key.to_string()), value.to_vec());
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> io::Result<()> {
        self.lock()?
            .remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedDocument {
    pub text: String,
    pub source: String,
    #[serde(default)]
    pub file_index: usize,
}

/// Documents and their vectors for one directory checksum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingBundle {
    pub checksum: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub documents: Vec<CachedDocument>,
    pub vectors: Vec<Vec<f32>>,
}

impl EmbeddingBundle {
    fn is_consistent(&self) -> bool {
        self.documents.len() == self.vectors.len()
    }
}

fn bundle_key(checksum: &str) -> String {
    format!("bundle-{}", checksum)
}

fn query_key(query: &str) -> String {
    format!("query-{}", hash_text(query))
}

/// Checksum-validated embedding cache for one embedding model.
pub struct EmbeddingCache<'a> {
    store: &'a dyn CacheStore,
    namespace: String,
}

impl<'a> EmbeddingCache<'a> {
    pub fn new(store: &'a dyn CacheStore, model: &str) -> Self {
        Self {
            store,
            namespace: model.to_string(),
        }
    }

    /// Bundle for `checksum`, or `None` on any mismatch or read problem.
    pub fn load(&self, checksum: &str) -> Option<EmbeddingBundle> {
        let recorded = match self.store.get(&self.namespace, CHECKSUM_KEY) {
            Ok(Some(bytes)) => String::from_utf8_lossy(&bytes).trim().to_string(),
            Ok(None) => {
                debug!("No embedding cache for {}", self.namespace);
                return None;
            }
            Err(e) => {
                warn!("Failed to read embedding cache checksum: {}", e);
                return None;
            }
        };

        if recorded != checksum {
            debug!("Embedding cache checksum changed, recomputing");
            return None;
        }

        let bytes = match self.store.get(&self.namespace, &bundle_key(checksum)) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                warn!("Embedding cache bundle is missing, recomputing");
                return None;
            }
            Err(e) => {
                warn!("Failed to read embedding cache bundle: {}", e);
                return None;
            }
        };

        match serde_json::from_slice::<EmbeddingBundle>(&bytes) {
            Ok(bundle) if bundle.checksum == checksum && bundle.is_consistent() => Some(bundle),
            Ok(_) => {
                warn!("Embedding cache bundle is inconsistent, recomputing");
                None
            }
            Err(e) => {
                warn!("Embedding cache bundle is corrupt ({}), recomputing", e);
                None
            }
        }
    }

    /// Persist `bundle` as the only valid entry.
    pub fn save(&self, bundle: &EmbeddingBundle) -> Result<()> {
        let previous = self
            .store
            .get(&self.namespace, CHECKSUM_KEY)
            .ok()
            .flatten()
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string());

        let bytes = serde_json::to_vec(bundle).context("Failed to serialize embedding bundle")?;
        self.store
            .put(&self.namespace, &bundle_key(&bundle.checksum), &bytes)
            .context("Failed to write embedding bundle")?;
        self.store
            .put(&self.namespace, CHECKSUM_KEY, bundle.checksum.as_bytes())
            .context("Failed to write embedding checksum")?;

        if let Some(old) = previous.filter(|old| *old != bundle.checksum) {
            if let Err(e) = self.store.remove(&self.namespace, &bundle_key(&old)) {
                warn!("Failed to remove stale embedding bundle: {}", e);
            }
        }
        Ok(())
    }

    pub fn query_vector(&self, query: &str) -> Option<Vec<f32>> {
        let bytes = self.store.get(&self.namespace, &query_key(query)).ok()??;
        match serde_json::from_slice(&bytes) {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!("Cached query vector is corrupt ({}), recomputing", e);
                None
            }
        }
    }

    pub fn save_query_vector(&self, query: &str, vector: &[f32]) -> Result<()> {
        let bytes = serde_json::to_vec(vector).context("Failed to serialize query vector")?;
        self.store
            .put(&self.namespace, &query_key(query), &bytes)
            .context("Failed to write query vector")
    }
}
