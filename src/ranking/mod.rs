//! Relevance ranking for focused mode.
//!
//! Files are chunked, embedded (reusing the checksum-validated cache when the
//! workspace is unchanged) and scored against the embedded query.

pub mod cache;
pub mod chunker;
pub mod index;
pub mod ranker;

pub use cache::FileCacheStore;
pub use ranker::RelevanceRanker;
