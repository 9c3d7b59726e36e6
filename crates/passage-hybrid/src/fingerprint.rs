//! Deterministic cache keys for optimized queries.

use serde::Serialize;

use passage_core::types::{Filters, Strategy};
use passage_core::OptimizedQuery;

#[derive(Serialize)]
struct Key<'a> {
    text: &'a str,
    original: Option<&'a str>,
    strategy: Strategy,
    filters: &'a Filters,
    limit: usize,
    threshold: u32,
}

/// blake3 hex digest over the fields that change what a retrieval returns.
///
/// Phrasings that optimize to the same query share an entry unless
/// `reranked` is set: fine rerank scores against the original text, so then
/// it is part of the key. Filters are a `BTreeMap` and serialize in key order.
pub fn fingerprint(query: &OptimizedQuery, reranked: bool) -> String {
    let key = Key {
        text: query.optimized_text(),
        original: reranked.then(|| query.original_text()),
        strategy: query.strategy(),
        filters: query.filters(),
        limit: query.result_limit(),
        threshold: query.similarity_threshold().to_bits(),
    };
    // Serializing plain strings, integers and JSON values cannot fail.
    let bytes = serde_json::to_vec(&key).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(text: &str, strategy: Strategy) -> OptimizedQuery {
        OptimizedQuery::new(text, text, strategy).expect("query")
    }

    #[test]
    fn equal_queries_share_a_fingerprint() {
        let a = OptimizedQuery::new("What is the return policy?", "return policy", Strategy::Keyword).expect("query");
        let b = OptimizedQuery::new("return policy??", "return policy", Strategy::Keyword).expect("query");
        assert_eq!(fingerprint(&a, false), fingerprint(&b, false));
        assert_eq!(fingerprint(&a, false).len(), 64);
        assert_ne!(fingerprint(&a, true), fingerprint(&b, true));
        assert_eq!(fingerprint(&a, true), fingerprint(&a, true));
    }

    #[test]
    fn every_semantic_field_changes_the_key() {
        let base = query("return policy", Strategy::Keyword);
        let base_fp = fingerprint(&base, false);
        let mut filters = Filters::new();
        filters.insert("type".into(), json!("policy"));

        assert_ne!(base_fp, fingerprint(&query("refund policy", Strategy::Keyword), false));
        assert_ne!(base_fp, fingerprint(&query("return policy", Strategy::Hybrid), false));
        assert_ne!(base_fp, fingerprint(&base.clone().with_filters(filters), false));
        assert_ne!(base_fp, fingerprint(&base.clone().with_result_limit(20), false));
        assert_ne!(base_fp, fingerprint(&base.with_similarity_threshold(0.5).expect("threshold"), false));
    }
}
