//! passage-store
//!
//! In-process `VectorStore` backend: cosine similarity over stored vectors and
//! tantivy-based keyword search. Useful for tests, demos and small corpora.

pub mod memory;
pub mod tantivy_utils;

pub use memory::MemoryStore;
