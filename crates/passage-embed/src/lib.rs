//! passage-embed
//!
//! A deterministic, model-free embedding provider plus the text
//! preparation and vector math shared by the engine and the stores.

use async_trait::async_trait;
use rust_stemmers::{Algorithm, Stemmer};
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use passage_core::traits::EmbeddingProvider;
use passage_core::{Error, Result};

pub const MAX_EMBED_CHARS: usize = 8000;
pub const DEFAULT_DIM: usize = 384;

/// Trim, collapse whitespace and cap the length of text before embedding.
pub fn prepare_text(text: &str) -> Result<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(Error::Embedding("text cannot be empty".to_string()));
    }
    Ok(collapsed.chars().take(MAX_EMBED_CHARS).collect())
}

/// Dot product over the product of magnitudes. Zero when the lengths differ
/// or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0f32, 0f32, 0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

/// Feature-hashing embedder: every lower-cased, English-stemmed token lands in
/// a bucket chosen by its xxHash, and the vector is L2-normalised. Same text,
/// same vector; inflections of a word share a bucket.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    fn embed_sync(&self, text: &str) -> Result<Vec<f32>> {
        let text = prepare_text(text)?;
        let stemmer = Stemmer::create(Algorithm::English);
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if token.is_empty() {
                continue;
            }
            let token = if token.chars().all(|c| c.is_ascii_alphabetic()) { stemmer.stem(&token).into_owned() } else { token };
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += 0.5 + val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self { Self::new(DEFAULT_DIM) }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> { self.embed_sync(text) }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tracing::trace!(batch = texts.len(), "hashing embed batch");
        texts.iter().map(|t| self.embed_sync(t)).collect()
    }

    fn dimension(&self) -> usize { self.dim }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_text_collapses_and_truncates() {
        assert_eq!(prepare_text("  a \n\n b\tc ").expect("text"), "a b c");
        let long = "x".repeat(MAX_EMBED_CHARS + 10);
        assert_eq!(prepare_text(&long).expect("text").len(), MAX_EMBED_CHARS);
        assert!(matches!(prepare_text(" \n "), Err(Error::Embedding(_))));
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 1.0], &[-1.0, -1.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
