use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chunker::TextChunker;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::types::Document;

/// Turns raw text files into normalised, chunked documents ready for a vector store.
#[derive(Default)]
pub struct DataProcessor {
    chunker: TextChunker,
    normalize: bool,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_chunker(chunker: TextChunker) -> Self { Self { chunker, normalize: false } }

    /// Chunk sizes from `settings.chunking`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::with_chunker(TextChunker::from_config(settings.chunking)?))
    }

    /// Run [`DataProcessor::preprocess`] on every document before chunking.
    /// Off by default since it flattens newlines, which are split points.
    pub fn normalizing(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<Document>> {
        self.process_files(data_dir, self.list_txt_files(data_dir))
    }

    pub fn process_directory_limited(&self, data_dir: &Path, limit: usize) -> Result<Vec<Document>> {
        let mut files = self.list_txt_files(data_dir);
        if files.len() > limit {
            files.truncate(limit);
            tracing::info!(limit, "limited to first files");
        }
        self.process_files(data_dir, files)
    }

    fn process_files(&self, data_dir: &Path, files: Vec<PathBuf>) -> Result<Vec<Document>> {
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!(file = %file_path.display(), "processing file {}/{}", file_index + 1, files.len());
            let document = self.load_document(file_path, data_dir)?;
            if document.content.trim().is_empty() {
                tracing::warn!(file = %file_path.display(), "skipping empty file");
                continue;
            }
            let document = if self.normalize { Self::preprocess(document) } else { document };
            all_chunks.extend(self.chunker.chunk(&document)?);
        }
        tracing::info!(files = files.len(), chunks = all_chunks.len(), "processed directory");
        Ok(all_chunks)
    }

    pub fn load_document(&self, file_path: &Path, data_dir: &Path) -> Result<Document> {
        let content = self.read_file_content(file_path)?;
        Ok(Document::new(self.extract_doc_id(file_path), content)
            .with_metadata("doc_path", file_path.to_string_lossy().to_string())
            .with_metadata("category", self.get_facet_from_path(file_path, data_dir)))
    }

    /// Collapse whitespace, drop control characters and record processing metadata.
    pub fn preprocess(document: Document) -> Document {
        let document_type = detect_document_type(&document.content);
        let cleaned = document
            .content
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .filter(|c| !c.is_control())
            .collect::<String>();
        let content_length = cleaned.chars().count();
        Document { content: cleaned, ..document }
            .with_metadata("processed_at", chrono::Utc::now().to_rfc3339())
            .with_metadata("content_length", json!(content_length))
            .with_metadata("document_type", document_type)
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        let bytes = fs::read(file_path)
            .map_err(|e| Error::Input(format!("cannot read {}: {e}", file_path.display())))?;
        Ok(match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).to_string(),
        })
    }

    fn extract_doc_id(&self, file_path: &Path) -> String {
        file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string_lossy().to_string())
    }

    fn get_facet_from_path(&self, file_path: &Path, data_dir: &Path) -> String {
        let relative_path = file_path.strip_prefix(data_dir).unwrap_or(file_path);
        match relative_path.parent().and_then(|p| p.to_str()) {
            Some(facet) if !facet.is_empty() => facet.to_string(),
            _ => "misc".to_string(),
        }
    }

    fn list_txt_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut txt_files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("txt") {
                txt_files.push(path.to_path_buf());
            }
        }
        txt_files.sort();
        txt_files
    }
}

fn detect_document_type(content: &str) -> &'static str {
    if content.contains("<html>") || content.contains("<HTML>") {
        "html"
    } else if content.contains('{') && content.contains('}') {
        "json"
    } else {
        "text"
    }
}
