//! Vector similarity search.

use crate::ranking::chunker::Chunk;

/// Cosine similarity. Vectors of different lengths or zero norm score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

pub trait VectorIndex {
    /// Replace the indexed contents.
    fn index(&mut self, entries: Vec<(Chunk, Vec<f32>)>);

    /// Top `k` chunks by descending score; equal scores keep insertion order.
    fn query(&self, vector: &[f32], k: usize) -> Vec<ScoredChunk>;

    fn len(&self) -> usize;
}

/// Brute-force index held in memory.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    entries: Vec<(Chunk, Vec<f32>)>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorIndex for InMemoryIndex {
    fn index(&mut self, entries: Vec<(Chunk, Vec<f32>)>) {
        self.entries = entries;
    }

    fn query(&self, vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|(chunk, v)| ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(vector, v),
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str, i: usize) -> Chunk {
        Chunk {
            source: source.to_string(),
            file_index: i,
            text: source.to_string(),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_query_orders_by_score() {
        let mut index = InMemoryIndex::new();
        index.index(vec![
            (chunk("far", 0), vec![0.0, 1.0]),
            (chunk("near", 1), vec![1.0, 0.1]),
            (chunk("mid", 2), vec![1.0, 1.0]),
        ]);
        let hits = index.query(&[1.0, 0.0], 2);
        let names: Vec<_> = hits.iter().map(|h| h.chunk.source.as_str()).collect();
        assert_eq!(names, vec!["near", "mid"]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_ties_keep_walk_order() {
        let mut index = InMemoryIndex::new();
        index.index(vec![
            (chunk("b", 0), vec![1.0, 0.0]),
            (chunk("a", 1), vec![2.0, 0.0]),
            (chunk("c", 2), vec![3.0, 0.0]),
        ]);
        let names: Vec<_> = index
            .query(&[1.0, 0.0], 10)
            .into_iter()
            .map(|h| h.chunk.source)
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(index.len(), 3);
    }
}
