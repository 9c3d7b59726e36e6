//! passage-core
//!
//! Shared data model, error type and collaborator traits for the retrieval
//! engine, plus configuration, text chunking and document ingestion.

pub mod chunker;
pub mod config;
pub mod data_processor;
pub mod error;
pub mod metrics;
pub mod traits;
pub mod types;

pub use chunker::TextChunker;
pub use error::{Error, Result};
pub use types::{Document, OptimizedQuery, Query, RetrievalResult, Strategy};
