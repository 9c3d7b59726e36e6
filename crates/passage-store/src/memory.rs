use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use passage_core::traits::{EmbeddingProvider, VectorStore};
use passage_core::{Document, Error, Result};
use passage_embed::cosine_similarity;

use crate::tantivy_utils::open_ram_index;

#[derive(Default)]
struct Documents {
	items: Vec<Document>,
	positions: HashMap<String, usize>,
}

/// In-process store: brute-force cosine over stored vectors for similarity
/// search, and a tantivy RAM index (BM25) for keyword search.
pub struct MemoryStore {
	embedder: Arc<dyn EmbeddingProvider>,
	docs: RwLock<Documents>,
	index: Index,
	writer: Mutex<IndexWriter>,
	reader: IndexReader,
	id_field: Field,
	text_field: Field,
}

impl MemoryStore {
	pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
		Self::open(embedder).map_err(|e| Error::Provider(format!("cannot create keyword index: {e:#}")))
	}

	fn open(embedder: Arc<dyn EmbeddingProvider>) -> anyhow::Result<Self> {
		let (index, fields) = open_ram_index();
		let writer: IndexWriter = index.writer(50_000_000)?;
		let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		Ok(Self { embedder, docs: RwLock::new(Documents::default()), index, writer: Mutex::new(writer), reader, id_field: fields.id, text_field: fields.text })
	}

	/// Insert or replace documents by id. Missing embeddings are computed in one batch.
	pub async fn add_documents(&self, documents: Vec<Document>) -> Result<usize> {
		if documents.is_empty() { return Ok(0); }
		let missing: Vec<String> = documents.iter().filter(|d| d.embedding.is_none()).map(|d| d.content.clone()).collect();
		let computed = if missing.is_empty() { Vec::new() } else { self.embedder.embed_batch(&missing).await? };
		let mut computed = computed.into_iter();
		let mut ready = Vec::with_capacity(documents.len());
		for mut d in documents {
			if d.embedding.is_none() {
				d.embedding = Some(computed.next().ok_or_else(|| Error::Embedding("embedding batch returned too few vectors".into()))?);
			}
			ready.push(d);
		}
		self.index_text(&ready).map_err(|e| Error::Provider(format!("keyword indexing failed: {e:#}")))?;

		let count = ready.len();
		let mut docs = self.docs.write().map_err(|_| Error::Provider("document table lock poisoned".into()))?;
		for d in ready {
			match docs.positions.get(&d.id).copied() {
				Some(pos) => docs.items[pos] = d,
				None => {
					let pos = docs.items.len();
					docs.positions.insert(d.id.clone(), pos);
					docs.items.push(d);
				}
			}
		}
		tracing::debug!(added = count, total = docs.items.len(), "memory store updated");
		Ok(count)
	}

	pub fn len(&self) -> usize { self.docs.read().map(|d| d.items.len()).unwrap_or(0) }

	pub fn is_empty(&self) -> bool { self.len() == 0 }

	fn index_text(&self, documents: &[Document]) -> anyhow::Result<()> {
		let mut writer = self.writer.lock().map_err(|_| anyhow!("index writer lock poisoned"))?;
		for d in documents {
			writer.delete_term(Term::from_field_text(self.id_field, &d.id));
			writer.add_document(doc!(self.id_field => d.id.clone(), self.text_field => d.content.clone()))?;
		}
		writer.commit()?;
		self.reader.reload()?;
		Ok(())
	}

	fn keyword_hits(&self, text: &str, k: usize) -> anyhow::Result<Vec<(f32, String)>> {
		let searcher = self.reader.searcher();
		let qp = QueryParser::for_index(&self.index, vec![self.text_field]);
		let (query, errors) = qp.parse_query_lenient(text);
		if !errors.is_empty() { tracing::debug!(?errors, "lenient keyword query parse"); }
		let top_docs = searcher.search(&query, &TopDocs::with_limit(k.max(1)))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let id = doc.get_first(self.id_field).and_then(|v| v.as_str()).unwrap_or("").to_string();
			hits.push((score, id));
		}
		Ok(hits)
	}
}

#[async_trait]
impl VectorStore for MemoryStore {
	async fn similarity_search(&self, _text: &str, query_vector: &[f32], top_k: usize, threshold: f32) -> Result<Vec<Document>> {
		let docs = self.docs.read().map_err(|_| Error::Provider("document table lock poisoned".into()))?;
		let mut scored: Vec<(f32, usize)> = docs
			.items
			.iter()
			.enumerate()
			.filter_map(|(i, d)| d.embedding.as_deref().map(|e| (cosine_similarity(query_vector, e), i)))
			.filter(|(score, _)| *score >= threshold)
			.collect();
		scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
		scored.truncate(top_k);
		Ok(scored.into_iter().map(|(score, i)| docs.items[i].clone().with_score(score)).collect())
	}

	async fn keyword_search(&self, text: &str, top_k: usize) -> Result<Vec<Document>> {
		if top_k == 0 { return Ok(vec![]); }
		let hits = self.keyword_hits(text, top_k).map_err(|e| Error::Provider(format!("keyword search failed: {e:#}")))?;
		let docs = self.docs.read().map_err(|_| Error::Provider("document table lock poisoned".into()))?;
		Ok(hits
			.into_iter()
			.filter_map(|(score, id)| docs.positions.get(&id).map(|&pos| docs.items[pos].clone().with_score(score)))
			.collect())
	}
}
