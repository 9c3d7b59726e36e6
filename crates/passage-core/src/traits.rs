//! Capability interfaces for the collaborators the retrieval core depends on.
//!
//! Any backend (in-process, remote, test double) may implement these.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;
use crate::metrics::MetricEvent;
use crate::types::{Document, RetrievalResult};

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Fails with `Error::Embedding` on empty text or when the provider is unavailable.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Preferred over repeated `embed` calls wherever possible.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimension(&self) -> usize;
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Nearest neighbours of the query, best first, with `score >= threshold`.
    async fn similarity_search(
        &self,
        text: &str,
        query_vector: &[f32],
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<Document>>;

    /// Lexical match, best first. Ranking is backend-defined.
    async fn keyword_search(&self, text: &str, top_k: usize) -> Result<Vec<Document>>;
}

/// Fingerprint-keyed result cache. Purely an optimisation: callers treat any
/// error as a miss.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, fingerprint: &str) -> Result<Option<RetrievalResult>>;
    async fn put(&self, fingerprint: &str, value: RetrievalResult, ttl: Duration) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Observer for pipeline events. Must not block.
pub trait MetricsSink: Send + Sync {
    fn record(&self, event: &MetricEvent);
}
