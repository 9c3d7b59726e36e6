use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use passage_core::config::Settings;
use passage_core::metrics::MetricEvent;
use passage_core::traits::{EmbeddingProvider, MetricsSink, VectorStore};
use passage_core::{Error, Query, Result, RetrievalResult};
use passage_query::{QueryAnalyzer, QueryOptimizer};

use crate::engine::RetrievalEngine;

/// analyze -> optimize -> execute, with query lifecycle events.
pub struct QueryPipeline {
    analyzer: QueryAnalyzer,
    optimizer: QueryOptimizer,
    engine: RetrievalEngine,
}

impl QueryPipeline {
    pub fn new(analyzer: QueryAnalyzer, optimizer: QueryOptimizer, engine: RetrievalEngine) -> Self {
        Self { analyzer, optimizer, engine }
    }

    /// Default analyzer, optimizer and engine for one store and embedder.
    pub fn from_settings(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: Settings,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let optimizer = QueryOptimizer::new(settings.retrieval.clone());
        let engine = RetrievalEngine::new(store, embedder, settings).with_metrics(metrics);
        Self::new(QueryAnalyzer::new(), optimizer, engine)
    }

    pub fn with_synonyms(mut self, synonyms: HashMap<String, Vec<String>>) -> Self {
        self.optimizer = self.optimizer.with_synonyms(synonyms);
        self
    }

    pub fn engine(&self) -> &RetrievalEngine { &self.engine }

    pub async fn run(&self, query: &Query) -> Result<RetrievalResult> {
        let metrics = self.engine.metrics();
        let query_id = query.label().to_string();
        let started = Instant::now();
        metrics.record(&MetricEvent::QueryStarted { query_id: query_id.clone() });

        match self.run_inner(query).await {
            Ok(result) => {
                let elapsed = started.elapsed();
                tracing::info!(
                    query_id = %query_id,
                    strategy = %result.strategy,
                    results = result.documents.len(),
                    from_cache = result.from_cache,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "query completed"
                );
                metrics.record(&MetricEvent::QueryCompleted {
                    query_id,
                    strategy: result.strategy,
                    results: result.documents.len(),
                    elapsed,
                    from_cache: result.from_cache,
                });
                Ok(result)
            }
            Err(err) => {
                let err = Error::optimization(err);
                tracing::warn!(query_id = %query_id, error = %err, "query failed");
                metrics.record(&MetricEvent::Error { query_id, kind: err.kind() });
                Err(err)
            }
        }
    }

    async fn run_inner(&self, query: &Query) -> Result<RetrievalResult> {
        let analysis = self.analyzer.analyze(&query.text)?;
        let optimized = self.optimizer.optimize(query, &analysis)?;
        self.engine.execute(&optimized).await
    }
}
