use std::sync::{Arc, Once};

use passage_core::config::Settings;
use passage_core::metrics::{MetricEvent, RecordingMetrics};
use passage_core::{Document, Error, Query, Strategy, TextChunker};
use passage_embed::HashingEmbedder;
use passage_hybrid::QueryPipeline;
use passage_store::MemoryStore;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_env_filter("passage=debug").with_test_writer().try_init();
    });
}

fn corpus() -> Vec<Document> {
    vec![
        Document::new("returns", "Our return policy allows refunds within 30 days of purchase.")
            .with_metadata("type", "policy"),
        Document::new("shipping", "Standard shipping takes five business days."),
        Document::new("warranty", "The warranty covers manufacturing defects for two years."),
    ]
}

async fn pipeline(metrics: Arc<RecordingMetrics>) -> QueryPipeline {
    init_tracing();
    let embedder = Arc::new(HashingEmbedder::default());
    let store = MemoryStore::new(embedder.clone()).expect("store");
    store.add_documents(corpus()).await.expect("index");
    QueryPipeline::from_settings(Arc::new(store), embedder, Settings::default(), metrics)
}

#[tokio::test]
async fn question_runs_as_keyword_search() {
    let metrics = Arc::new(RecordingMetrics::new());
    let pipeline = pipeline(metrics.clone()).await;

    let result = pipeline.run(&Query::new("What is the return policy?").with_id("q-1")).await.expect("result");
    assert_eq!(result.strategy, Strategy::Keyword);
    assert_eq!(result.ids().first(), Some(&"returns"));

    let names: Vec<&str> = metrics.events().iter().map(MetricEvent::name).collect();
    assert_eq!(names, ["query-started", "cache-miss", "query-completed"]);
    match metrics.events().last() {
        Some(MetricEvent::QueryCompleted { query_id, from_cache, .. }) => {
            assert_eq!(query_id, "q-1");
            assert!(!from_cache);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn inflected_query_finds_the_base_form() {
    let pipeline = pipeline(Arc::new(RecordingMetrics::new())).await;
    let result = pipeline.run(&Query::new("shipping times")).await.expect("result");
    assert_eq!(result.strategy, Strategy::Keyword);
    assert_eq!(result.ids().first(), Some(&"shipping"));
}

#[tokio::test]
async fn rephrased_question_hits_the_cache() {
    let metrics = Arc::new(RecordingMetrics::new());
    let pipeline = pipeline(metrics.clone()).await;
    pipeline.run(&Query::new("What is the return policy?")).await.expect("first");
    let second = pipeline.run(&Query::new("what is the return policy")).await.expect("second");
    assert!(second.from_cache);
    assert_eq!(metrics.count("cache-hit"), 1);
}

#[tokio::test]
async fn empty_query_is_an_input_error() {
    let metrics = Arc::new(RecordingMetrics::new());
    let pipeline = pipeline(metrics.clone()).await;
    let err = pipeline.run(&Query::new("   ")).await.expect_err("empty");
    assert!(matches!(err, Error::Input(_)));
    assert!(metrics
        .events()
        .iter()
        .any(|e| matches!(e, MetricEvent::Error { kind: "input", .. })));
}

#[tokio::test]
async fn chunked_documents_are_retrievable() {
    let embedder = Arc::new(HashingEmbedder::default());
    let store = MemoryStore::new(embedder.clone()).expect("store");
    let body = "Smoke detectors should be tested monthly. ".repeat(40) + "Replace the batteries in every detector each spring.";
    let chunks = TextChunker::new(400, 80).expect("chunker").chunk(&Document::new("safety", body)).expect("chunks");
    assert!(chunks.len() > 1);
    store.add_documents(chunks).await.expect("index");

    let pipeline = QueryPipeline::from_settings(Arc::new(store), embedder, Settings::default(), Arc::new(RecordingMetrics::new()));
    let result = pipeline.run(&Query::new("batteries spring").with_limit(3)).await.expect("result");
    assert!(result.documents.len() <= 3);
    assert!(result.ids().first().is_some_and(|id| id.starts_with("safety:")));
}
