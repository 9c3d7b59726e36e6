//! Boundary-aware, overlapping text chunking for indexing.
//!
//! Offsets are measured in characters (Unicode scalar values).

use serde_json::json;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::Document;

#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    config: ChunkingConfig,
    custom: bool,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self { config: ChunkingConfig::default(), custom: false }
    }
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        Self::from_config(ChunkingConfig { chunk_size, overlap })
    }

    /// Chunks record `chunk_size` and `overlap` in their metadata whenever
    /// `config` differs from the defaults.
    pub fn from_config(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, custom: config != ChunkingConfig::default() })
    }

    pub fn config(&self) -> ChunkingConfig { self.config }

    pub fn chunk(&self, document: &Document) -> Result<Vec<Document>> {
        if document.content.trim().is_empty() {
            return Err(Error::Input(format!("document '{}' has no content", document.id)));
        }
        let chars: Vec<char> = document.content.chars().collect();
        let len = chars.len();
        let mut spans = Vec::new();
        let mut cursor = 0usize;
        while cursor < len {
            let tentative_end = (cursor + self.config.chunk_size).min(len);
            let end = if tentative_end < len { self.split_point(&chars, cursor, tentative_end) } else { tentative_end };
            spans.push((cursor, end));
            if end >= len {
                break;
            }
            debug_assert!(end - self.config.overlap > cursor);
            cursor = end - self.config.overlap;
        }

        let total_chunks = spans.len();
        let chunks = spans
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (start, end))| {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".into(), json!(chunk_index));
                metadata.insert("chunk_start".into(), json!(start));
                metadata.insert("chunk_end".into(), json!(end));
                metadata.insert("total_chunks".into(), json!(total_chunks));
                if self.custom {
                    metadata.insert("chunk_size".into(), json!(self.config.chunk_size));
                    metadata.insert("overlap".into(), json!(self.config.overlap));
                }
                Document {
                    id: format!("{}:{}", document.id, chunk_index),
                    content: chars[start..end].iter().collect(),
                    metadata,
                    score: None,
                    embedding: None,
                }
            })
            .collect::<Vec<_>>();
        tracing::debug!(doc_id = %document.id, chars = len, chunks = chunks.len(), "chunked document");
        Ok(chunks)
    }

    /// Prefer a sentence end, then whitespace, searching backward from
    /// `end - 1`. Candidates must lie above `cursor + max(chunk_size / 2, overlap)`
    /// so the next cursor always moves forward.
    fn split_point(&self, chars: &[char], cursor: usize, end: usize) -> usize {
        let floor = cursor + (self.config.chunk_size / 2).max(self.config.overlap);
        if let Some(i) = (floor + 1..end).rev().find(|&i| matches!(chars[i], '.' | '?' | '!' | '\n')) {
            return i + 1;
        }
        if let Some(i) = (floor + 1..end).rev().find(|&i| chars[i].is_whitespace()) {
            return i;
        }
        end
    }
}
