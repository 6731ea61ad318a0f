//! Coordinator result and observability types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::schedule::ExpiryEntry;
use crate::store::ExpiryReason;

// == Lookup Outcome ==
/// Result of resolving a short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Served from the cache after re-validation against the store
    CacheHit(String),
    /// Not cached; fetched from the store and cached for next time
    CacheMissStoreHit(String),
    /// Absent from both cache and store
    NotFound,
    /// Existed, but its policy was spent; it has been reconciled away
    Expired(ExpiryReason),
}

impl LookupOutcome {
    /// The resolved target, if the lookup succeeded.
    pub fn value(&self) -> Option<&str> {
        match self {
            LookupOutcome::CacheHit(v) | LookupOutcome::CacheMissStoreHit(v) => Some(v),
            LookupOutcome::NotFound | LookupOutcome::Expired(_) => None,
        }
    }

    /// Short label, e.g. for response bodies.
    pub fn label(&self) -> &'static str {
        match self {
            LookupOutcome::CacheHit(_) => "cache_hit",
            LookupOutcome::CacheMissStoreHit(_) => "cache_miss_store_hit",
            LookupOutcome::NotFound => "not_found",
            LookupOutcome::Expired(_) => "expired",
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub size: usize,
    pub capacity: usize,
    /// HIT / (HIT + MISS) over the retained cache records
    pub recent_hit_rate: f64,
    /// hits / (hits + misses) since startup
    pub lifetime_hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Entries waiting in the expiry scheduler
    pub scheduled: usize,
}

// == Scheduled Expiry ==
/// One row of the expiry schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledExpiry {
    pub key: String,
    pub expires_at: DateTime<Utc>,
    /// Milliseconds left, zero once due
    pub remaining_ms: i64,
}

impl ScheduledExpiry {
    pub(crate) fn from_entry(entry: ExpiryEntry, now: DateTime<Utc>) -> Self {
        let remaining_ms = entry.time_remaining(now).num_milliseconds();
        Self {
            key: entry.key,
            expires_at: entry.expires_at,
            remaining_ms,
        }
    }
}
