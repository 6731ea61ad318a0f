//! Coordinator Module
//!
//! The single entry point to the cache, the expiry scheduler and the
//! operation log. Both the HTTP layer and the sweeper act through it.
//!
//! The cache and the scheduler share one async mutex. It is held only for
//! in-memory work and never across a store call.
//!
//! Writes that change which record a key maps to (insert, and deleting an
//! expired or vanished record) take a second mutex that is held across
//! their store calls. A deletion re-reads the record under it and backs
//! off if a live record has replaced the one that expired.

mod types;

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::BoundedCache;
use crate::config::Config;
use crate::error::Result;
use crate::events::{EventRecorder, LogCategory, OperationKind, OperationRecord};
use crate::schedule::ExpiryScheduler;
use crate::store::{ExpiryPolicy, ExpiryReason, LinkRecord, LinkStore};

pub use types::{LookupOutcome, ScheduledExpiry, StatsSnapshot};

// == Core State ==
/// Everything guarded by the coordinator's critical section.
struct CoreState {
    cache: BoundedCache,
    schedule: ExpiryScheduler,
}

// == Coordinator ==
/// Owns the in-memory structures and mediates every access to them.
pub struct Coordinator<S> {
    store: S,
    state: Mutex<CoreState>,
    /// Serializes store writes; always taken before `state`
    writes: Mutex<()>,
    recorder: Arc<EventRecorder>,
}

impl<S: LinkStore> Coordinator<S> {
    // == Constructors ==
    /// Creates a coordinator sized and configured from `config`.
    pub fn new(store: S, config: &Config) -> Self {
        let recorder = Arc::new(EventRecorder::new(
            config.cache_log_retention,
            config.heap_log_retention,
        ));
        Self::with_recorder(store, config.cache_capacity, recorder)
    }

    /// Creates a coordinator with default log retention.
    pub fn with_capacity(store: S, capacity: NonZeroUsize) -> Self {
        Self::with_recorder(store, capacity, Arc::new(EventRecorder::default()))
    }

    fn with_recorder(store: S, capacity: NonZeroUsize, recorder: Arc<EventRecorder>) -> Self {
        Self {
            store,
            state: Mutex::new(CoreState {
                cache: BoundedCache::new(capacity, recorder.clone()),
                schedule: ExpiryScheduler::new(recorder.clone()),
            }),
            writes: Mutex::new(()),
            recorder,
        }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // == Lookup ==
    /// Resolves `key`.
    ///
    /// Cache hits are still checked against the store record, since a
    /// time or click limit can be reached without the cache noticing. A
    /// cached entry only counts as a HIT once that check passes; one that
    /// turns out expired, deleted or outdated counts as a MISS.
    ///
    /// A successful lookup of a click-limited link counts as one click.
    pub async fn lookup(&self, key: &str) -> Result<LookupOutcome> {
        let cached = {
            let mut state = self.state.lock().await;
            let cached = state.cache.peek(key).map(str::to_owned);
            if cached.is_none() {
                self.log_miss(&mut state, key, "falling back to store");
            }
            cached
        };

        let Some(record) = self.store.get(key).await? else {
            if cached.is_some() {
                debug!("Cached key '{}' no longer in store, dropping it", key);
                self.stale_miss(key, "no longer in store").await;
                self.reconcile(key, None, Utc::now()).await?;
            }
            return Ok(LookupOutcome::NotFound);
        };

        if let Some(reason) = record.policy.expired(Utc::now()) {
            if cached.is_some() {
                self.stale_miss(key, "expired").await;
            }
            self.reconcile(key, Some(reason), Utc::now()).await?;
            return Ok(LookupOutcome::Expired(reason));
        }

        if let ExpiryPolicy::Clicks { max_clicks, .. } = record.policy {
            match self.store.increment_counter(key).await? {
                Some(clicks) if clicks <= max_clicks => {}
                Some(clicks) => {
                    debug!("Link '{}' reached click {} of {}", key, clicks, max_clicks);
                    if cached.is_some() {
                        self.stale_miss(key, "expired").await;
                    }
                    let reason = ExpiryReason::ClickLimit;
                    self.reconcile(key, Some(reason), Utc::now()).await?;
                    return Ok(LookupOutcome::Expired(reason));
                }
                None => {
                    // Deleted or replaced since it was read
                    if cached.is_some() {
                        self.stale_miss(key, "no longer in store").await;
                    }
                    return Ok(LookupOutcome::NotFound);
                }
            }
        }

        let mut state = self.state.lock().await;
        let still_cached = state.cache.peek(key) == Some(record.value.as_str());
        if still_cached && cached.as_deref() == Some(record.value.as_str()) {
            state.cache.get(key);
            return Ok(LookupOutcome::CacheHit(record.value));
        }
        if cached.is_some() {
            self.log_miss(&mut state, key, "cached value outdated");
        }
        state.cache.put(key.to_string(), record.value.clone());
        Ok(LookupOutcome::CacheMissStoreHit(record.value))
    }

    fn log_miss(&self, state: &mut CoreState, key: &str, detail: &str) {
        let start = Instant::now();
        state.cache.record_miss();
        self.recorder.record(
            OperationKind::Miss,
            key,
            start.elapsed(),
            "O(1)",
            detail,
            state.cache.len(),
        );
    }

    /// Counts a cached entry that could not be served as a miss.
    async fn stale_miss(&self, key: &str, detail: &str) {
        let mut state = self.state.lock().await;
        self.log_miss(&mut state, key, detail);
    }

    // == Insert ==
    /// Writes a link through to the store and schedules its expiry.
    ///
    /// The cache is populated lazily on first lookup; any previously cached
    /// target for the same key is dropped.
    pub async fn insert(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        policy: ExpiryPolicy,
    ) -> Result<LinkRecord> {
        let record = LinkRecord::new(key, value, policy);

        let _writes = self.writes.lock().await;
        self.store.put(record.clone()).await?;

        let mut state = self.state.lock().await;
        state.cache.remove(&record.key);
        state.schedule.remove(&record.key);
        if let Some(expires_at) = record.policy.expires_at() {
            state.schedule.insert(record.key.clone(), expires_at);
        }
        Ok(record)
    }

    // == Remove ==
    /// Drops `key` from the cache and the scheduler. The store is untouched.
    ///
    /// Returns true if either structure held the key.
    pub async fn remove(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;
        let cached = state.cache.remove(key);
        let scheduled = state.schedule.remove(key);
        cached || scheduled
    }

    // == Delete ==
    /// Deletes `key` from the store, then drops it from the cache and the
    /// scheduler. Returns false if the store held no record for it.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let _writes = self.writes.lock().await;
        let deleted = self.store.delete(key).await?;
        self.remove(key).await;
        Ok(deleted)
    }

    // == Find Existing ==
    /// Returns a live record already pointing at `value`, recording a DEDUP.
    pub async fn find_existing(&self, value: &str) -> Result<Option<LinkRecord>> {
        let start = Instant::now();
        let Some(record) = self.store.find_by_value(value).await? else {
            return Ok(None);
        };
        if record.policy.expired(Utc::now()).is_some() {
            return Ok(None);
        }

        let size = self.state.lock().await.cache.len();
        self.recorder.record(
            OperationKind::Dedup,
            &record.key,
            start.elapsed(),
            "O(n)",
            format!("reusing existing link for {}", value),
            size,
        );
        Ok(Some(record))
    }

    // == Sweep ==
    /// Reconciles every scheduled entry that is due at `now`.
    ///
    /// Only the heap minimum is inspected, so a sweep costs O(k log n) for
    /// k due entries. A due entry whose key now holds a live record is
    /// dropped without touching the store. Entries whose store calls fail
    /// are re-scheduled for the next sweep unless the key was scheduled
    /// again in the meantime. Returns the number of entries reconciled.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let due = {
            let mut state = self.state.lock().await;
            let mut due = Vec::new();
            while state.schedule.peek_min().is_some_and(|e| e.is_due(now)) {
                let Some(entry) = state.schedule.extract_min() else {
                    break;
                };
                due.push(entry);
            }
            due
        };

        let mut reconciled = 0;
        for entry in due {
            match self.reconcile(&entry.key, Some(ExpiryReason::TimeLimit), now).await {
                Ok(true) => reconciled += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!("Failed to delete expired link '{}': {}", entry.key, err);
                    let mut state = self.state.lock().await;
                    if !state.schedule.contains(&entry.key) {
                        state.schedule.insert(entry.key, entry.expires_at);
                    }
                }
            }
        }
        reconciled
    }

    // == Reconcile ==
    /// Removes `key` from the store, the cache and the scheduler, unless
    /// the store now holds a record for it that is live at `now`.
    ///
    /// Returns false when such a live record was found and left alone. A
    /// record that is already gone from the store is not an error: the
    /// sweeper or another request got there first. With a `reason`, an
    /// EXPIRED record is logged.
    async fn reconcile(
        &self,
        key: &str,
        reason: Option<ExpiryReason>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let _writes = self.writes.lock().await;
        let start = Instant::now();

        let deleted = match self.store.get(key).await? {
            Some(current) if current.policy.expired(now).is_none() => {
                debug!("Link '{}' was replaced by a live record, keeping it", key);
                return Ok(false);
            }
            Some(_) => self.store.delete(key).await?,
            None => false,
        };

        let size = {
            let mut state = self.state.lock().await;
            state.cache.remove(key);
            state.schedule.remove(key);
            state.cache.len()
        };
        if let Some(reason) = reason {
            self.record_expired(key, reason, deleted, start, size);
        }
        Ok(true)
    }

    fn record_expired(
        &self,
        key: &str,
        reason: ExpiryReason,
        deleted: bool,
        start: Instant,
        size: usize,
    ) {
        if !deleted {
            debug!("Expired link '{}' was already removed from the store", key);
        }
        let detail = if deleted {
            reason.to_string()
        } else {
            format!("{} (already removed)", reason)
        };
        self.recorder
            .record(OperationKind::Expired, key, start.elapsed(), "O(log n)", detail, size);
    }

    // == Observability ==
    /// Current size, capacity and hit-rate figures.
    pub async fn stats(&self) -> StatsSnapshot {
        let state = self.state.lock().await;
        let counters = state.cache.stats();
        StatsSnapshot {
            size: state.cache.len(),
            capacity: state.cache.capacity(),
            recent_hit_rate: self.recorder.recent_hit_rate(),
            lifetime_hit_rate: counters.hit_rate(),
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            scheduled: state.schedule.len(),
        }
    }

    /// Scheduled expiries ordered soonest first.
    pub async fn schedule_snapshot(&self) -> Vec<ScheduledExpiry> {
        let now = Utc::now();
        let entries = self.state.lock().await.schedule.snapshot();
        entries
            .into_iter()
            .map(|entry| ScheduledExpiry::from_entry(entry, now))
            .collect()
    }

    /// Cached keys ordered from least to most recently used.
    pub async fn cached_keys(&self) -> Vec<String> {
        self.state.lock().await.cache.keys()
    }

    /// Up to `n` most recent records of a category, most-recent-last.
    pub fn recent_events(&self, category: LogCategory, n: usize) -> Vec<OperationRecord> {
        self.recorder.recent(category, n)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn coordinator(capacity: usize) -> Coordinator<MemoryStore> {
        Coordinator::with_capacity(MemoryStore::new(), NonZeroUsize::new(capacity).unwrap())
    }

    #[tokio::test]
    async fn test_lookup_not_found() {
        let coord = coordinator(3);
        assert_eq!(coord.lookup("nope").await.unwrap(), LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_insert_is_lazy_then_cached() {
        let coord = coordinator(3);
        coord.insert("a", "https://a.example", ExpiryPolicy::Never).await.unwrap();
        assert!(coord.cached_keys().await.is_empty());

        assert_eq!(
            coord.lookup("a").await.unwrap(),
            LookupOutcome::CacheMissStoreHit("https://a.example".to_string())
        );
        assert_eq!(
            coord.lookup("a").await.unwrap(),
            LookupOutcome::CacheHit("https://a.example".to_string())
        );
        assert_eq!(coord.cached_keys().await, vec!["a"]);
    }

    #[tokio::test]
    async fn test_lru_scenario_through_coordinator() {
        let coord = coordinator(3);
        for key in ["a", "b", "c", "d"] {
            coord.insert(key, format!("https://{}.example", key), ExpiryPolicy::Never)
                .await
                .unwrap();
        }
        for key in ["a", "b", "c"] {
            coord.lookup(key).await.unwrap();
        }
        assert_eq!(coord.cached_keys().await, vec!["a", "b", "c"]);

        coord.lookup("a").await.unwrap();
        assert_eq!(coord.cached_keys().await, vec!["b", "c", "a"]);

        coord.lookup("d").await.unwrap();
        assert_eq!(coord.cached_keys().await, vec!["c", "a", "d"]);
        assert_eq!(coord.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_past_expiry_reconciled_by_lookup() {
        let coord = coordinator(3);
        let past = Utc::now() - Duration::seconds(1);
        coord
            .insert("old", "https://old.example", ExpiryPolicy::At { expires_at: past })
            .await
            .unwrap();
        assert_eq!(coord.schedule_snapshot().await.len(), 1);

        assert_eq!(
            coord.lookup("old").await.unwrap(),
            LookupOutcome::Expired(ExpiryReason::TimeLimit)
        );
        assert!(coord.schedule_snapshot().await.is_empty());
        assert!(coord.store().get("old").await.unwrap().is_none());

        let expired = coord.recent_events(LogCategory::Cache, 1);
        assert_eq!(expired[0].kind, OperationKind::Expired);
        assert_eq!(expired[0].detail, "time limit reached");

        assert_eq!(coord.lookup("old").await.unwrap(), LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_cached_entry_revalidated_after_expiry() {
        let coord = coordinator(3);
        let soon = Utc::now() + Duration::milliseconds(50);
        coord
            .insert("t", "https://t.example", ExpiryPolicy::At { expires_at: soon })
            .await
            .unwrap();
        assert!(matches!(
            coord.lookup("t").await.unwrap(),
            LookupOutcome::CacheMissStoreHit(_)
        ));

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;

        assert_eq!(
            coord.lookup("t").await.unwrap(),
            LookupOutcome::Expired(ExpiryReason::TimeLimit)
        );
        assert!(coord.cached_keys().await.is_empty());

        // The cached entry was never served, so it is not a hit.
        let stats = coord.stats().await;
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 2);
        assert!(coord
            .recent_events(LogCategory::Cache, 100)
            .iter()
            .all(|r| r.kind != OperationKind::Hit));
    }

    #[tokio::test]
    async fn test_cached_entry_deleted_elsewhere_counts_as_miss() {
        let coord = coordinator(3);
        coord.insert("d", "https://d.example", ExpiryPolicy::Never).await.unwrap();
        coord.lookup("d").await.unwrap();
        coord.store().delete("d").await.unwrap();

        assert_eq!(coord.lookup("d").await.unwrap(), LookupOutcome::NotFound);
        let stats = coord.stats().await;
        assert_eq!((stats.hits, stats.misses), (0, 2));
        assert_eq!(stats.recent_hit_rate, 0.0);
    }

    #[tokio::test]
    async fn test_click_limit() {
        let coord = coordinator(3);
        let policy = ExpiryPolicy::Clicks { max_clicks: 2, clicks: 0 };
        coord.insert("c", "https://c.example", policy).await.unwrap();

        assert!(coord.lookup("c").await.unwrap().value().is_some());
        assert!(coord.lookup("c").await.unwrap().value().is_some());
        assert_eq!(
            coord.lookup("c").await.unwrap(),
            LookupOutcome::Expired(ExpiryReason::ClickLimit)
        );
        let expired = coord.recent_events(LogCategory::Cache, 1);
        assert_eq!(expired[0].detail, "click limit reached");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent_and_keeps_store() {
        let coord = coordinator(3);
        let later = Utc::now() + Duration::hours(1);
        coord
            .insert("r", "https://r.example", ExpiryPolicy::At { expires_at: later })
            .await
            .unwrap();
        coord.lookup("r").await.unwrap();

        assert!(coord.remove("r").await);
        assert!(!coord.remove("r").await);
        assert!(coord.cached_keys().await.is_empty());
        assert!(coord.schedule_snapshot().await.is_empty());
        assert!(coord.store().get("r").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reinsert_replaces_schedule_and_cached_value() {
        let coord = coordinator(3);
        let now = Utc::now();
        coord
            .insert("k", "https://one.example", ExpiryPolicy::At { expires_at: now + Duration::hours(1) })
            .await
            .unwrap();
        coord.lookup("k").await.unwrap();

        coord
            .insert("k", "https://two.example", ExpiryPolicy::At { expires_at: now + Duration::hours(2) })
            .await
            .unwrap();

        let schedule = coord.schedule_snapshot().await;
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].expires_at, now + Duration::hours(2));
        assert_eq!(
            coord.lookup("k").await.unwrap().value(),
            Some("https://two.example")
        );
    }

    #[tokio::test]
    async fn test_sweep_only_removes_due_entries() {
        let coord = coordinator(3);
        let now = Utc::now();
        for (key, secs) in [("a", -5), ("b", -1), ("c", 60)] {
            coord
                .insert(key, "https://x.example", ExpiryPolicy::At { expires_at: now + Duration::seconds(secs) })
                .await
                .unwrap();
        }

        assert_eq!(coord.sweep_expired(now).await, 2);
        let remaining: Vec<String> = coord
            .schedule_snapshot()
            .await
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(remaining, vec!["c"]);
        assert!(coord.store().get("a").await.unwrap().is_none());
        assert!(coord.store().get("c").await.unwrap().is_some());
        assert_eq!(coord.sweep_expired(now).await, 0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_replacement() {
        let coord = coordinator(3);
        let past = Utc::now() - Duration::seconds(1);
        coord
            .insert("k", "https://old.example", ExpiryPolicy::At { expires_at: past })
            .await
            .unwrap();
        // Replaced behind the scheduler's back
        coord
            .store()
            .put(LinkRecord::new("k", "https://new.example", ExpiryPolicy::Never))
            .await
            .unwrap();

        assert_eq!(coord.sweep_expired(Utc::now()).await, 0);
        assert!(coord.schedule_snapshot().await.is_empty());
        assert_eq!(
            coord.lookup("k").await.unwrap().value(),
            Some("https://new.example")
        );
        assert!(coord
            .recent_events(LogCategory::Cache, 100)
            .iter()
            .all(|r| r.kind != OperationKind::Expired));
    }

    #[tokio::test]
    async fn test_failed_sweep_does_not_duplicate_schedule() {
        let coord = coordinator(3);
        let past = Utc::now() - Duration::seconds(1);
        coord
            .insert("s", "https://s.example", ExpiryPolicy::At { expires_at: past })
            .await
            .unwrap();

        coord.store().set_unavailable(true);
        assert_eq!(coord.sweep_expired(Utc::now()).await, 0);
        assert_eq!(coord.sweep_expired(Utc::now()).await, 0);
        assert_eq!(coord.schedule_snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let coord = coordinator(3);
        let later = Utc::now() + Duration::hours(1);
        coord
            .insert("x", "https://x.example", ExpiryPolicy::At { expires_at: later })
            .await
            .unwrap();
        coord.lookup("x").await.unwrap();

        assert!(coord.delete("x").await.unwrap());
        assert!(coord.cached_keys().await.is_empty());
        assert!(coord.schedule_snapshot().await.is_empty());
        assert!(!coord.delete("x").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_tolerates_already_deleted_record() {
        let coord = coordinator(3);
        let past = Utc::now() - Duration::seconds(1);
        coord
            .insert("gone", "https://g.example", ExpiryPolicy::At { expires_at: past })
            .await
            .unwrap();
        coord.store().delete("gone").await.unwrap();

        assert_eq!(coord.sweep_expired(Utc::now()).await, 1);
        let record = &coord.recent_events(LogCategory::Cache, 1)[0];
        assert_eq!(record.kind, OperationKind::Expired);
        assert!(record.detail.contains("already removed"));
    }

    #[tokio::test]
    async fn test_sweep_reschedules_on_store_failure() {
        let coord = coordinator(3);
        let past = Utc::now() - Duration::seconds(1);
        coord
            .insert("s", "https://s.example", ExpiryPolicy::At { expires_at: past })
            .await
            .unwrap();

        coord.store().set_unavailable(true);
        assert_eq!(coord.sweep_expired(Utc::now()).await, 0);
        assert_eq!(coord.schedule_snapshot().await.len(), 1);

        coord.store().set_unavailable(false);
        assert_eq!(coord.sweep_expired(Utc::now()).await, 1);
        assert!(coord.schedule_snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates_from_lookup() {
        let coord = coordinator(3);
        coord.store().set_unavailable(true);
        assert!(matches!(
            coord.lookup("a").await,
            Err(crate::error::LinkError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_find_existing_records_dedup() {
        let coord = coordinator(3);
        coord.insert("a", "https://same.example", ExpiryPolicy::Never).await.unwrap();

        let found = coord.find_existing("https://same.example").await.unwrap();
        assert_eq!(found.map(|r| r.key), Some("a".to_string()));
        assert_eq!(
            coord.recent_events(LogCategory::Cache, 1)[0].kind,
            OperationKind::Dedup
        );
        assert!(coord.find_existing("https://other.example").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats() {
        let coord = coordinator(2);
        coord.insert("a", "https://a.example", ExpiryPolicy::Never).await.unwrap();
        coord.lookup("a").await.unwrap();
        coord.lookup("a").await.unwrap();

        let stats = coord.stats().await;
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.recent_hit_rate - 0.5).abs() < f64::EPSILON);
        assert!((stats.lifetime_hit_rate - 0.5).abs() < f64::EPSILON);
    }
}
