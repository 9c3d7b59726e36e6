//! In-process retrieval cache on moka.
//!
//! Entries carry their own TTL; moka evicts on expiry or when the capacity
//! bound is hit. Nothing here spawns timers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::sync::Cache as MokaCache;
use moka::Expiry;

use passage_core::traits::Cache;
use passage_core::{Result, RetrievalResult};

/// Stored once and replaced wholesale on the next `put` for the same key.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub value: RetrievalResult,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

struct EntryTtl;

impl Expiry<String, Arc<CacheEntry>> for EntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Arc<CacheEntry>, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Arc<CacheEntry>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct RetrievalCache {
    entries: MokaCache<String, Arc<CacheEntry>>,
}

impl RetrievalCache {
    pub fn new(max_entries: u64) -> Self {
        let entries = MokaCache::builder().max_capacity(max_entries).expire_after(EntryTtl).build();
        Self { entries }
    }

    pub fn entry(&self, fingerprint: &str) -> Option<Arc<CacheEntry>> {
        self.entries.get(fingerprint)
    }

    /// Approximate; moka applies pending writes lazily.
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RetrievalCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl Cache for RetrievalCache {
    async fn get(&self, fingerprint: &str) -> Result<Option<RetrievalResult>> {
        Ok(self.entries.get(fingerprint).map(|entry| entry.value.clone()))
    }

    async fn put(&self, fingerprint: &str, value: RetrievalResult, ttl: Duration) -> Result<()> {
        let entry = CacheEntry { fingerprint: fingerprint.to_string(), value, created_at: Utc::now(), ttl };
        self.entries.insert(fingerprint.to_string(), Arc::new(entry));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passage_core::{Document, Strategy};

    fn result(ids: &[&str]) -> RetrievalResult {
        let docs = ids.iter().map(|id| Document::new(*id, "body")).collect();
        RetrievalResult::new(docs, Strategy::Semantic, Strategy::Semantic, Duration::from_millis(3))
    }

    #[tokio::test]
    async fn put_then_get() {
        let cache = RetrievalCache::new(16);
        cache.put("fp", result(&["a", "b"]), Duration::from_secs(60)).await.expect("put");
        let hit = cache.get("fp").await.expect("get").expect("hit");
        assert_eq!(hit.ids(), ["a", "b"]);
        let entry = cache.entry("fp").expect("entry");
        assert_eq!(entry.fingerprint, "fp");
        assert_eq!(entry.ttl, Duration::from_secs(60));
        assert!(cache.get("other").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn put_replaces_the_whole_entry() {
        let cache = RetrievalCache::new(16);
        cache.put("fp", result(&["a"]), Duration::from_secs(60)).await.expect("put");
        cache.put("fp", result(&["z"]), Duration::from_secs(30)).await.expect("put");
        let entry = cache.entry("fp").expect("entry");
        assert_eq!(entry.value.ids(), ["z"]);
        assert_eq!(entry.ttl, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let cache = RetrievalCache::new(16);
        cache.put("short", result(&["a"]), Duration::from_millis(20)).await.expect("put");
        cache.put("long", result(&["b"]), Duration::from_secs(60)).await.expect("put");
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get("short").await.expect("get").is_none());
        assert!(cache.get("long").await.expect("get").is_some());
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = RetrievalCache::new(16);
        cache.put("a", result(&["a"]), Duration::from_secs(60)).await.expect("put");
        cache.clear().await.expect("clear");
        assert!(cache.get("a").await.expect("get").is_none());
    }
}
