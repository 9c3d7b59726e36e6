//! Retrieval execution: cache lookup, strategy dispatch, hybrid fan-out with
//! per-branch deadlines, fusion, optional fine rerank and cache store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use passage_core::config::Settings;
use passage_core::metrics::{MetricEvent, NoopMetrics};
use passage_core::traits::{Cache, EmbeddingProvider, MetricsSink, VectorStore};
use passage_core::types::Filters;
use passage_core::{Document, Error, OptimizedQuery, Result, RetrievalResult, Strategy};

use crate::cache::RetrievalCache;
use crate::fingerprint::fingerprint;
use crate::fusion::fuse_hybrid;
use crate::rerank::FusionReranker;

/// Documents from one branch plus the query vector, if one was computed.
struct Branch {
    documents: Vec<Document>,
    query_vector: Option<Vec<f32>>,
}

pub struct RetrievalEngine {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    cache: Arc<dyn Cache>,
    metrics: Arc<dyn MetricsSink>,
    reranker: FusionReranker,
    settings: Settings,
}

impl RetrievalEngine {
    /// In-process moka cache sized from `settings`, metrics discarded.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>, settings: Settings) -> Self {
        let cache = Arc::new(RetrievalCache::new(settings.retrieval.cache_capacity));
        let reranker = FusionReranker::new(embedder.clone(), settings.rerank);
        Self { store, embedder, cache, metrics: Arc::new(NoopMetrics), reranker, settings }
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn metrics(&self) -> Arc<dyn MetricsSink> { self.metrics.clone() }

    pub fn cache(&self) -> Arc<dyn Cache> { self.cache.clone() }

    /// Serve from cache, or retrieve and cache. Failures outside a recovered
    /// hybrid branch surface as `Error::Optimization`.
    pub async fn execute(&self, query: &OptimizedQuery) -> Result<RetrievalResult> {
        let started = Instant::now();
        let fp = fingerprint(query, self.reranker.settings().final_top_k.is_some());
        match self.cache.get(&fp).await {
            Ok(Some(mut hit)) => {
                tracing::debug!(fingerprint = %fp, "cache hit");
                self.metrics.record(&MetricEvent::CacheHit { fingerprint: fp });
                hit.from_cache = true;
                hit.elapsed = started.elapsed();
                return Ok(hit);
            }
            Ok(None) => tracing::debug!(fingerprint = %fp, "cache miss"),
            Err(err) => tracing::warn!(fingerprint = %fp, error = %err, "cache lookup failed; treating as miss"),
        }
        self.metrics.record(&MetricEvent::CacheMiss { fingerprint: fp.clone() });

        let requested = query.strategy();
        let (documents, used, query_vector) = match requested {
            Strategy::Semantic => {
                let branch = self.semantic(query).await.map_err(Error::optimization)?;
                (branch.documents, Strategy::Semantic, branch.query_vector)
            }
            Strategy::Keyword => {
                let branch = self.keyword(query).await.map_err(Error::optimization)?;
                (branch.documents, Strategy::Keyword, None)
            }
            Strategy::Hybrid => self.hybrid(query).await?,
        };

        // The engine's vector embeds the optimized text; rerank keys on the original.
        let reusable = query_vector.as_deref().filter(|_| query.original_text() == query.optimized_text());
        let (documents, stats) = self.reranker.rerank(query.original_text(), reusable, documents).await;
        if let Some(stats) = stats {
            self.metrics.record(&MetricEvent::RerankInvoked {
                candidates: stats.candidates,
                kept: stats.kept,
                fallbacks: stats.fallbacks,
                elapsed: stats.elapsed,
            });
        }

        let result = RetrievalResult::new(documents, used, requested, started.elapsed());
        if result.is_degraded() {
            tracing::debug!(fingerprint = %fp, "degraded result not cached");
        } else if let Err(err) = self.cache.put(&fp, result.clone(), self.settings.retrieval.cache_ttl()).await {
            tracing::warn!(fingerprint = %fp, error = %err, "cache store failed");
        }
        Ok(result)
    }

    async fn semantic(&self, query: &OptimizedQuery) -> Result<Branch> {
        let vector = self.embedder.embed(query.optimized_text()).await?;
        let documents = self
            .store
            .similarity_search(query.optimized_text(), &vector, query.result_limit(), query.similarity_threshold())
            .await?;
        Ok(Branch { documents: narrow(documents, query.filters(), query.result_limit()), query_vector: Some(vector) })
    }

    async fn keyword(&self, query: &OptimizedQuery) -> Result<Branch> {
        let documents = self.store.keyword_search(query.optimized_text(), query.result_limit()).await?;
        Ok(Branch { documents: narrow(documents, query.filters(), query.result_limit()), query_vector: None })
    }

    /// Both branches run concurrently, each under its own deadline. One
    /// failure degrades to the other branch; two fail the request.
    async fn hybrid(&self, query: &OptimizedQuery) -> Result<(Vec<Document>, Strategy, Option<Vec<f32>>)> {
        let deadline = self.settings.retrieval.branch_timeout();
        let (semantic, keyword) = tokio::join!(
            with_deadline(Strategy::Semantic, deadline, self.semantic(query)),
            with_deadline(Strategy::Keyword, deadline, self.keyword(query)),
        );

        match (semantic, keyword) {
            (Ok(semantic), Ok(keyword)) => {
                let fused = fuse_hybrid(&semantic.documents, &keyword.documents, self.settings.fusion, query.result_limit());
                Ok((fused, Strategy::Hybrid, semantic.query_vector))
            }
            (Ok(semantic), Err(err)) => {
                self.degrade(Strategy::Keyword, Strategy::Semantic, &err);
                Ok((semantic.documents, Strategy::Semantic, semantic.query_vector))
            }
            (Err(err), Ok(keyword)) => {
                self.degrade(Strategy::Semantic, Strategy::Keyword, &err);
                Ok((keyword.documents, Strategy::Keyword, None))
            }
            (Err(semantic_err), Err(keyword_err)) => {
                tracing::warn!(semantic = %semantic_err, keyword = %keyword_err, "both hybrid branches failed");
                Err(Error::optimization(semantic_err))
            }
        }
    }

    fn degrade(&self, failed: Strategy, used: Strategy, err: &Error) {
        tracing::warn!(%failed, %used, error = %err, "hybrid branch failed; degrading");
        self.metrics.record(&MetricEvent::BranchDegraded { failed, used, reason: err.to_string() });
    }
}

async fn with_deadline<F>(branch: Strategy, deadline: Duration, fut: F) -> Result<Branch>
where
    F: std::future::Future<Output = Result<Branch>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout { branch, deadline }),
    }
}

/// Metadata-equality post-filter, then the result bound.
fn narrow(mut documents: Vec<Document>, filters: &Filters, limit: usize) -> Vec<Document> {
    if !filters.is_empty() {
        documents.retain(|d| d.matches(filters));
    }
    documents.truncate(limit);
    documents
}
