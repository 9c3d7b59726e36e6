//! passage-hybrid
//!
//! Executes optimized queries: fingerprint-keyed caching, semantic, keyword
//! and concurrent hybrid retrieval, rank fusion and fine reranking.

pub mod cache;
pub mod engine;
pub mod fingerprint;
pub mod fusion;
pub mod pipeline;
pub mod rerank;

pub use cache::{CacheEntry, RetrievalCache};
pub use engine::RetrievalEngine;
pub use fingerprint::fingerprint;
pub use fusion::{fuse, fuse_hybrid, RankedList};
pub use pipeline::QueryPipeline;
pub use rerank::{FusionReranker, RerankCandidate, RerankStats};
