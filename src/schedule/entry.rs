//! Expiry Entry Module
//!
//! A key paired with the absolute instant at which it stops being valid.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

// == Expiry Entry ==
/// A scheduled expiry. Ordered by instant, then by insertion sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryEntry {
    pub key: String,
    pub expires_at: DateTime<Utc>,
    /// Insertion sequence, breaks ties between equal instants
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl ExpiryEntry {
    pub fn new(key: impl Into<String>, expires_at: DateTime<Utc>, seq: u64) -> Self {
        Self {
            key: key.into(),
            expires_at,
            seq,
        }
    }

    // == Is Due ==
    /// An entry is due once `now` has reached its instant.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    // == Time Remaining ==
    /// Remaining time until expiry, clamped at zero.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

impl Ord for ExpiryEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.expires_at
            .cmp(&other.expires_at)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for ExpiryEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
