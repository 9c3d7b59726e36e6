//! Domain types shared by the analyzer, the engine and the storage backends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

pub type DocumentId = String;

/// Free-form document metadata. Ordered so that serialisation (and therefore
/// fingerprinting) is deterministic.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Metadata-equality filter criteria attached to a query.
pub type Filters = BTreeMap<String, serde_json::Value>;

pub const MIN_RESULT_LIMIT: usize = 1;
pub const MAX_RESULT_LIMIT: usize = 100;
pub const DEFAULT_RESULT_LIMIT: usize = 10;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

/// Which retrieval path(s) execute for a query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    Semantic,
    Keyword,
    Hybrid,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Semantic => "SEMANTIC",
            Strategy::Keyword => "KEYWORD",
            Strategy::Hybrid => "HYBRID",
        };
        f.write_str(s)
    }
}

/// A raw query as received from the owning service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    pub id: Option<String>,
    pub text: String,
    pub filters: Filters,
    /// Requested number of results; clamped during optimization.
    pub limit: Option<usize>,
    /// Overrides the default similarity threshold.
    pub similarity_threshold: Option<f32>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    /// Label used in logs and metric events.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("anonymous")
    }
}

/// A strategy-tagged query ready for execution.
///
/// Constructed through [`OptimizedQuery::new`] and the `with_*` methods, which
/// keep `result_limit` within `[1, 100]` and `similarity_threshold` within
/// `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedQuery {
    original_text: String,
    optimized_text: String,
    strategy: Strategy,
    filters: Filters,
    result_limit: usize,
    similarity_threshold: f32,
}

impl OptimizedQuery {
    pub fn new(
        original_text: impl Into<String>,
        optimized_text: impl Into<String>,
        strategy: Strategy,
    ) -> Result<Self> {
        let optimized_text = optimized_text.into();
        if optimized_text.trim().is_empty() {
            return Err(Error::Input("optimized query text is empty".to_string()));
        }
        Ok(Self {
            original_text: original_text.into(),
            optimized_text,
            strategy,
            filters: Filters::new(),
            result_limit: DEFAULT_RESULT_LIMIT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        })
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Any requested value is accepted and clamped into `[1, 100]`.
    pub fn with_result_limit(mut self, requested: usize) -> Self {
        self.result_limit = clamp_result_limit(requested);
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Input(format!("similarity threshold {threshold} is outside [0, 1]")));
        }
        self.similarity_threshold = threshold;
        Ok(self)
    }

    pub fn original_text(&self) -> &str { &self.original_text }
    pub fn optimized_text(&self) -> &str { &self.optimized_text }
    pub fn strategy(&self) -> Strategy { self.strategy }
    pub fn filters(&self) -> &Filters { &self.filters }
    pub fn result_limit(&self) -> usize { self.result_limit }
    pub fn similarity_threshold(&self) -> f32 { self.similarity_threshold }
}

pub fn clamp_result_limit(requested: usize) -> usize {
    requested.clamp(MIN_RESULT_LIMIT, MAX_RESULT_LIMIT)
}

/// A source document or one of its chunks.
///
/// `score` is engine-specific but higher is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub content: String,
    pub metadata: Metadata,
    pub score: Option<f32>,
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, content: impl Into<String>) -> Self {
        Self { id: id.into(), content: content.into(), metadata: Metadata::new(), score: None, embedding: None }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// True when every filter key is present in the metadata with an equal value.
    pub fn matches(&self, filters: &Filters) -> bool {
        filters.iter().all(|(k, v)| self.metadata.get(k) == Some(v))
    }
}

/// The ranked outcome of one retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub documents: Vec<Document>,
    /// Strategy that actually produced `documents`.
    pub strategy: Strategy,
    pub requested_strategy: Strategy,
    pub elapsed: Duration,
    pub from_cache: bool,
}

impl RetrievalResult {
    pub fn new(documents: Vec<Document>, strategy: Strategy, requested_strategy: Strategy, elapsed: Duration) -> Self {
        Self { documents, strategy, requested_strategy, elapsed, from_cache: false }
    }

    /// A HYBRID request that fell back to a single branch.
    pub fn is_degraded(&self) -> bool {
        self.strategy != self.requested_strategy
    }

    pub fn ids(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.id.as_str()).collect()
    }
}
