//! Fine rerank: a weighted multi-feature pass over a short candidate list.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde_json::Value;

use passage_core::config::RerankSettings;
use passage_core::traits::EmbeddingProvider;
use passage_core::types::Metadata;
use passage_core::Document;
use passage_embed::cosine_similarity;

const IDEAL_MIN_CHARS: usize = 200;
const IDEAL_MAX_CHARS: usize = 1000;

/// 1.0 inside [200, 1000] chars, linear ramp below, `1000 / len` above with a 0.5 floor.
pub fn length_score(chars: usize) -> f32 {
    if chars < IDEAL_MIN_CHARS {
        chars as f32 / IDEAL_MIN_CHARS as f32
    } else if chars <= IDEAL_MAX_CHARS {
        1.0
    } else {
        (IDEAL_MAX_CHARS as f32 / chars as f32).max(0.5)
    }
}

/// Fraction of lower-cased, whitespace-split query terms found in the content.
pub fn keyword_score(query: &str, content: &str) -> f32 {
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return 0.0;
    }
    let content = content.to_lowercase();
    let found = terms.iter().filter(|t| content.contains(t.as_str())).count();
    found as f32 / terms.len() as f32
}

pub fn metadata_score(metadata: &Metadata) -> f32 {
    let mut score: f32 = 0.5;
    if matches!(metadata.get("type").and_then(Value::as_str), Some("official" | "policy")) {
        score += 0.2;
    }
    if metadata.contains_key("lastUpdated") {
        score += 0.1;
    }
    if metadata.get("authority").and_then(Value::as_str) == Some("high") {
        score += 0.2;
    }
    score.min(1.0)
}

/// A document with its component scores.
#[derive(Debug, Clone, PartialEq)]
pub struct RerankCandidate {
    pub document: Document,
    /// `None` when the candidate could not be embedded.
    pub semantic: Option<f32>,
    pub length: f32,
    pub keyword: f32,
    pub metadata: f32,
    pub final_score: f32,
}

impl RerankCandidate {
    pub fn score(document: Document, query: &str, semantic: Option<f32>, settings: &RerankSettings) -> Self {
        let length = length_score(document.content.chars().count());
        let keyword = keyword_score(query, &document.content);
        let metadata = metadata_score(&document.metadata);
        let final_score = match semantic {
            Some(semantic) => {
                settings.semantic_weight * semantic
                    + settings.length_weight * length
                    + settings.keyword_weight * keyword
                    + settings.metadata_weight * metadata
            }
            None => document.score.unwrap_or(0.0),
        };
        Self { document, semantic, length, keyword, metadata, final_score }
    }
}

/// What a rerank pass did, for the `rerank-invoked` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RerankStats {
    pub candidates: usize,
    pub kept: usize,
    /// Candidates scored by their prior score because embedding failed.
    pub fallbacks: usize,
    pub elapsed: Duration,
}

pub struct FusionReranker {
    embedder: Arc<dyn EmbeddingProvider>,
    settings: RerankSettings,
}

impl FusionReranker {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, settings: RerankSettings) -> Self {
        Self { embedder, settings }
    }

    pub fn settings(&self) -> &RerankSettings { &self.settings }

    /// Rerank when `final_top_k` is set and there are more candidates than
    /// that. Returns the input unchanged with `None` otherwise, and also when
    /// the query itself cannot be embedded.
    pub async fn rerank(
        &self,
        query: &str,
        query_vector: Option<&[f32]>,
        candidates: Vec<Document>,
    ) -> (Vec<Document>, Option<RerankStats>) {
        let Some(top_k) = self.settings.final_top_k else {
            return (candidates, None);
        };
        if candidates.is_empty() || candidates.len() <= top_k {
            return (candidates, None);
        }
        let started = Instant::now();

        let query_vector = match query_vector {
            Some(v) => v.to_vec(),
            None => match self.embedder.embed(query).await {
                Ok(v) => v,
                Err(err) => {
                    tracing::warn!(error = %err, "query embedding failed; skipping rerank");
                    return (candidates, None);
                }
            },
        };

        let embeddings = self.candidate_embeddings(&candidates, query_vector.len()).await;
        let total = candidates.len();
        let mut fallbacks = 0;
        let mut scored: Vec<RerankCandidate> = candidates
            .into_iter()
            .zip(embeddings)
            .map(|(doc, embedding)| {
                let semantic = embedding.map(|e| cosine_similarity(&query_vector, &e));
                if semantic.is_none() {
                    fallbacks += 1;
                }
                RerankCandidate::score(doc, query, semantic, &self.settings)
            })
            .collect();

        scored.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
        scored.truncate(top_k);
        let stats = RerankStats { candidates: total, kept: scored.len(), fallbacks, elapsed: started.elapsed() };
        tracing::debug!(candidates = total, kept = stats.kept, fallbacks, "reranked candidates");

        let documents = scored.into_iter().map(|c| c.document.with_score(c.final_score)).collect();
        (documents, Some(stats))
    }

    /// One slot per candidate. Existing embeddings of the right dimension are
    /// reused; the rest go through one batch call, then per-candidate calls if
    /// the batch fails.
    async fn candidate_embeddings(&self, candidates: &[Document], dim: usize) -> Vec<Option<Vec<f32>>> {
        let mut out: Vec<Option<Vec<f32>>> = candidates
            .iter()
            .map(|d| d.embedding.clone().filter(|e| e.len() == dim))
            .collect();
        let missing: Vec<usize> = (0..out.len()).filter(|&i| out[i].is_none()).collect();
        if missing.is_empty() {
            return out;
        }

        let texts: Vec<String> = missing.iter().map(|&i| candidates[i].content.clone()).collect();
        match self.embedder.embed_batch(&texts).await {
            Ok(vectors) if vectors.len() == texts.len() => {
                for (&i, v) in missing.iter().zip(vectors) {
                    out[i] = Some(v);
                }
            }
            batch => {
                if let Err(err) = batch {
                    tracing::debug!(error = %err, "batch embedding failed; embedding candidates one by one");
                }
                let singles = join_all(texts.iter().map(|t| self.embedder.embed(t))).await;
                for (&i, result) in missing.iter().zip(singles) {
                    match result {
                        Ok(v) => out[i] = Some(v),
                        Err(err) => tracing::debug!(id = %candidates[i].id, error = %err, "candidate embedding failed"),
                    }
                }
            }
        }
        out
    }
}
