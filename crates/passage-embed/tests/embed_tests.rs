use passage_core::traits::EmbeddingProvider;
use passage_core::Error;
use passage_embed::{cosine_similarity, HashingEmbedder};

#[tokio::test]
async fn hashing_embedder_shapes_and_determinism() {
    let embedder = HashingEmbedder::new(1024);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).await.expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");
    assert_eq!(embedder.dimension(), 1024);

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[tokio::test]
async fn shared_vocabulary_scores_higher() {
    let embedder = HashingEmbedder::default();
    let q = embedder.embed("return policy").await.unwrap();
    let close = embedder.embed("Our return policy allows refunds").await.unwrap();
    let far = embedder.embed("shipping times for international orders").await.unwrap();
    assert!(cosine_similarity(&q, &close) > cosine_similarity(&q, &far));
}

#[tokio::test]
async fn empty_text_is_an_embedding_error() {
    let embedder = HashingEmbedder::default();
    assert!(matches!(embedder.embed("   ").await, Err(Error::Embedding(_))));
    let batch = vec!["ok".to_string(), String::new()];
    assert!(embedder.embed_batch(&batch).await.is_err());
}

#[tokio::test]
async fn inflections_share_a_vector() {
    let embedder = HashingEmbedder::default();
    let inflected = embedder.embed("Shipping policies").await.expect("embed");
    let stemmed = embedder.embed("ship polici").await.expect("embed");
    assert!((cosine_similarity(&inflected, &stemmed) - 1.0).abs() < 1e-5);
}
