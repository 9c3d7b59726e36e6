use std::sync::Arc;

use passage_core::traits::{EmbeddingProvider, VectorStore};
use passage_core::Document;
use passage_embed::HashingEmbedder;
use passage_store::MemoryStore;

fn corpus() -> Vec<Document> {
    vec![
        Document::new("returns", "Our return policy allows refunds within 30 days of purchase.")
            .with_metadata("type", "policy"),
        Document::new("shipping", "Standard shipping takes five business days."),
        Document::new("warranty", "The warranty covers manufacturing defects for two years."),
        Document::new("fire", "Keep a fire extinguisher near the kitchen and check it yearly."),
    ]
}

async fn seeded() -> (MemoryStore, Arc<HashingEmbedder>) {
    let embedder = Arc::new(HashingEmbedder::default());
    let store = MemoryStore::new(embedder.clone()).expect("store");
    let added = store.add_documents(corpus()).await.expect("add");
    assert_eq!(added, 4);
    (store, embedder)
}

#[tokio::test]
async fn keyword_search_ranks_matching_documents() {
    let (store, _) = seeded().await;
    let hits = store.keyword_search("refunds policy", 10).await.expect("search");
    assert_eq!(hits.first().map(|d| d.id.as_str()), Some("returns"));
    assert!(hits.iter().all(|d| d.score.is_some()));
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    // Punctuation in free text must not break parsing.
    let hits = store.keyword_search("What is the return policy?", 10).await.expect("lenient");
    assert!(hits.iter().any(|d| d.id == "returns"));
}

#[tokio::test]
async fn similarity_search_respects_threshold_and_top_k() {
    let (store, embedder) = seeded().await;
    let text = "Standard shipping takes five business days.";
    let q = embedder.embed(text).await.expect("embed");
    let hits = store.similarity_search(text, &q, 2, 0.0).await.expect("search");
    assert!(hits.len() <= 2);
    assert_eq!(hits[0].id, "shipping");
    assert!((hits[0].score.unwrap_or(0.0) - 1.0).abs() < 1e-4);

    let strict = store.similarity_search(text, &q, 10, 0.99).await.expect("search");
    assert_eq!(strict.len(), 1);
}

#[tokio::test]
async fn re_adding_an_id_replaces_the_document() {
    let (store, _) = seeded().await;
    store
        .add_documents(vec![Document::new("fire", "Fireplace safety checklist for winter.")])
        .await
        .expect("replace");
    assert_eq!(store.len(), 4);
    let old = store.keyword_search("extinguisher", 10).await.expect("search");
    assert!(old.is_empty());
    let new = store.keyword_search("fireplace", 10).await.expect("search");
    assert_eq!(new.len(), 1);
    assert_eq!(new[0].content, "Fireplace safety checklist for winter.");
}
