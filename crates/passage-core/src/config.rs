//! Configuration loader and typed settings.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_FUSION__SEMANTIC_WEIGHT`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{DEFAULT_RESULT_LIMIT, DEFAULT_SIMILARITY_THRESHOLD};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Typed settings layered over the built-in defaults, validated.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(self.figment.clone())
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub fusion: FusionWeights,
    pub rerank: RerankSettings,
    pub chunking: ChunkingConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.retrieval.validate()?;
        self.fusion.validate()?;
        self.rerank.validate()?;
        self.chunking.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub default_limit: usize,
    pub similarity_threshold: f32,
    pub branch_timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_RESULT_LIMIT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            branch_timeout_ms: 5_000,
            cache_ttl_secs: 3_600,
            cache_capacity: 10_000,
        }
    }
}

impl RetrievalSettings {
    pub fn branch_timeout(&self) -> Duration { Duration::from_millis(self.branch_timeout_ms) }
    pub fn cache_ttl(&self) -> Duration { Duration::from_secs(self.cache_ttl_secs) }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::InvalidConfig(format!(
                "retrieval.similarity_threshold {} is outside [0, 1]",
                self.similarity_threshold
            )));
        }
        if self.branch_timeout_ms == 0 {
            return Err(Error::InvalidConfig("retrieval.branch_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Per-source weights for rank fusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub semantic_weight: f32,
    pub keyword_weight: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { semantic_weight: 0.7, keyword_weight: 0.3 }
    }
}

impl FusionWeights {
    fn validate(&self) -> Result<()> {
        check_weights("fusion", &[self.semantic_weight, self.keyword_weight])
    }
}

/// Fine rerank configuration. Reranking only runs when `final_top_k` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankSettings {
    pub final_top_k: Option<usize>,
    pub semantic_weight: f32,
    pub length_weight: f32,
    pub keyword_weight: f32,
    pub metadata_weight: f32,
}

impl Default for RerankSettings {
    fn default() -> Self {
        Self { final_top_k: None, semantic_weight: 0.5, length_weight: 0.2, keyword_weight: 0.2, metadata_weight: 0.1 }
    }
}

impl RerankSettings {
    fn validate(&self) -> Result<()> {
        if self.final_top_k == Some(0) {
            return Err(Error::InvalidConfig("rerank.final_top_k must be positive".into()));
        }
        check_weights(
            "rerank",
            &[self.semantic_weight, self.length_weight, self.keyword_weight, self.metadata_weight],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 200 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be positive".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

fn check_weights(section: &str, weights: &[f32]) -> Result<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(Error::InvalidConfig(format!("{section} weights must be finite and non-negative")));
    }
    Ok(())
}
