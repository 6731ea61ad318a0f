//! Bounded Cache Module
//!
//! Fixed-capacity key/value cache with least-recently-used eviction.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use lru::LruCache;
use tracing::debug;

use crate::cache::CacheStats;
use crate::events::{EventRecorder, OperationKind};

// == Bounded Cache ==
/// Recency-ordered cache holding at most `capacity` entries.
///
/// Recency is the only ordering state: the backing map keeps entries
/// linked from least to most recently used, so promote, insert and
/// evict-oldest are all O(1).
pub struct BoundedCache {
    /// Key-value storage in recency order
    entries: LruCache<String, String>,
    /// Hit/miss/eviction counters
    stats: CacheStats,
    /// Shared operation log
    recorder: Arc<EventRecorder>,
}

impl BoundedCache {
    // == Constructor ==
    /// Creates an empty cache that holds at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize, recorder: Arc<EventRecorder>) -> Self {
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::new(),
            recorder,
        }
    }

    // == Get ==
    /// Returns the cached value and marks the key most recently used.
    ///
    /// A miss is only counted here; logging it is left to the caller.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let start = Instant::now();
        match self.entries.get(key) {
            Some(value) => {
                let value = value.clone();
                self.stats.record_hit();
                self.recorder.record(
                    OperationKind::Hit,
                    key,
                    start.elapsed(),
                    "O(1)",
                    "",
                    self.entries.len(),
                );
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Inserts or replaces a value at the most-recently-used end.
    ///
    /// When inserting a new key into a full cache the least recently used
    /// entry is evicted first.
    pub fn put(&mut self, key: String, value: String) {
        let start = Instant::now();

        if self.entries.pop(key.as_str()).is_none() && self.entries.len() >= self.capacity() {
            if let Some((evicted, _)) = self.entries.pop_lru() {
                self.stats.record_eviction();
                debug!("Evicted least recently used key '{}'", evicted);
                self.recorder.record(
                    OperationKind::Evict,
                    &evicted,
                    start.elapsed(),
                    "O(1)",
                    format!("capacity {} reached", self.capacity()),
                    self.entries.len(),
                );
            }
        }

        self.entries.put(key.clone(), value);
        debug_assert!(self.entries.len() <= self.capacity(), "cache bound violated");

        self.recorder.record(
            OperationKind::Set,
            &key,
            start.elapsed(),
            "O(1)",
            "",
            self.entries.len(),
        );
    }

    // == Remove ==
    /// Removes a key. Absent keys are a no-op.
    ///
    /// Returns true if an entry was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.pop(key).is_some()
    }

    // == Peek ==
    /// Returns the cached value without touching recency or the counters.
    pub fn peek(&self, key: &str) -> Option<&str> {
        self.entries.peek(key).map(String::as_str)
    }

    /// Counts a lookup the cache could not answer.
    ///
    /// For callers that [`peek`](BoundedCache::peek) first and only decide
    /// afterwards whether the entry was usable.
    pub fn record_miss(&mut self) {
        self.stats.record_miss();
    }

    // == Keys ==
    /// Returns keys ordered from least to most recently used.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().rev().map(|(k, _)| k.clone()).collect()
    }

    /// Checks membership without touching recency.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    // == Stats ==
    /// Returns a copy of the current counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LogCategory;

    fn cache(capacity: usize) -> (BoundedCache, Arc<EventRecorder>) {
        let recorder = Arc::new(EventRecorder::default());
        let cache = BoundedCache::new(NonZeroUsize::new(capacity).unwrap(), recorder.clone());
        (cache, recorder)
    }

    fn put(cache: &mut BoundedCache, key: &str) {
        cache.put(key.to_string(), format!("https://example.com/{}", key));
    }

    #[test]
    fn test_cache_new() {
        let (cache, _) = cache(3);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 3);
    }

    #[test]
    fn test_put_and_get() {
        let (mut cache, _) = cache(3);
        put(&mut cache, "a");

        assert_eq!(cache.get("a"), Some("https://example.com/a".to_string()));
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_get_promotes_and_put_evicts_oldest() {
        let (mut cache, _) = cache(3);
        put(&mut cache, "a");
        put(&mut cache, "b");
        put(&mut cache, "c");
        assert_eq!(cache.keys(), vec!["a", "b", "c"]);

        cache.get("a");
        assert_eq!(cache.keys(), vec!["b", "c", "a"]);

        put(&mut cache, "d");
        assert_eq!(cache.keys(), vec!["c", "a", "d"]);
        assert!(!cache.contains("b"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_put_existing_key_moves_to_newest_without_eviction() {
        let (mut cache, _) = cache(2);
        put(&mut cache, "a");
        put(&mut cache, "b");
        cache.put("a".to_string(), "updated".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["b", "a"]);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.get("a"), Some("updated".to_string()));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (mut cache, _) = cache(2);
        put(&mut cache, "a");

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_records_set_hit_and_evict() {
        let (mut cache, recorder) = cache(1);
        put(&mut cache, "a");
        cache.get("a");
        put(&mut cache, "b");

        let kinds: Vec<OperationKind> = recorder
            .recent(LogCategory::Cache, 10)
            .into_iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                OperationKind::Set,
                OperationKind::Hit,
                OperationKind::Evict,
                OperationKind::Set
            ]
        );

        let evict = &recorder.recent(LogCategory::Cache, 2)[0];
        assert_eq!(evict.key, "a");
        assert_eq!(evict.complexity, "O(1)");
    }

    #[test]
    fn test_peek_leaves_recency_and_counters() {
        let (mut cache, recorder) = cache(2);
        put(&mut cache, "a");
        put(&mut cache, "b");

        assert_eq!(cache.peek("a"), Some("https://example.com/a"));
        assert_eq!(cache.peek("zzz"), None);
        assert_eq!(cache.keys(), vec!["a", "b"]);
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().misses, 0);
        assert_eq!(recorder.len(LogCategory::Cache), 2);

        cache.record_miss();
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_miss_is_not_recorded_by_cache() {
        let (mut cache, recorder) = cache(1);
        cache.get("nope");
        assert_eq!(recorder.len(LogCategory::Cache), 0);
    }
}
