//! Event Recorder Module
//!
//! Keeps one bounded FIFO log per category. Appends and truncation are O(1).

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use crate::events::{LogCategory, OperationKind, OperationRecord};

// == Bounded Log ==
#[derive(Debug)]
struct BoundedLog {
    records: VecDeque<OperationRecord>,
    retention: usize,
}

impl BoundedLog {
    fn new(retention: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(retention),
            retention,
        }
    }

    fn push(&mut self, record: OperationRecord) {
        self.records.push_back(record);
        while self.records.len() > self.retention {
            self.records.pop_front();
        }
    }

    fn recent(&self, n: usize) -> Vec<OperationRecord> {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip).cloned().collect()
    }
}

// == Event Recorder ==
/// Append-only operation logs, one per [`LogCategory`].
///
/// Each log is guarded by its own lock which is only held for the
/// duration of a push or a copy, so readers never stall producers.
#[derive(Debug)]
pub struct EventRecorder {
    cache: Mutex<BoundedLog>,
    heap: Mutex<BoundedLog>,
}

impl EventRecorder {
    // == Constructor ==
    /// Creates a recorder with the given retention count per category.
    pub fn new(cache_retention: usize, heap_retention: usize) -> Self {
        Self {
            cache: Mutex::new(BoundedLog::new(cache_retention)),
            heap: Mutex::new(BoundedLog::new(heap_retention)),
        }
    }

    fn log(&self, category: LogCategory) -> &Mutex<BoundedLog> {
        match category {
            LogCategory::Cache => &self.cache,
            LogCategory::Heap => &self.heap,
        }
    }

    // == Record ==
    /// Appends a record to the log matching its kind.
    pub fn record(
        &self,
        kind: OperationKind,
        key: &str,
        elapsed: Duration,
        complexity: &'static str,
        detail: impl Into<String>,
        size: usize,
    ) {
        let record = OperationRecord::new(kind, key, elapsed, complexity, detail, size);
        self.push(record);
    }

    /// Appends an already built record.
    pub fn push(&self, record: OperationRecord) {
        self.log(record.category()).lock().push(record);
    }

    // == Recent ==
    /// Returns up to `n` most recent records of a category, most-recent-last.
    pub fn recent(&self, category: LogCategory, n: usize) -> Vec<OperationRecord> {
        self.log(category).lock().recent(n)
    }

    /// Number of records currently retained for a category.
    pub fn len(&self, category: LogCategory) -> usize {
        self.log(category).lock().records.len()
    }

    // == Recent Hit Rate ==
    /// HIT / (HIT + MISS) over the retained cache records, 0.0 if none.
    pub fn recent_hit_rate(&self) -> f64 {
        let log = self.cache.lock();
        let (hits, misses) = log
            .records
            .iter()
            .fold((0u64, 0u64), |(h, m), r| match r.kind {
                OperationKind::Hit => (h + 1, m),
                OperationKind::Miss => (h, m + 1),
                _ => (h, m),
            });
        if hits + misses == 0 {
            0.0
        } else {
            hits as f64 / (hits + misses) as f64
        }
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new(
            crate::events::DEFAULT_CACHE_RETENTION,
            crate::events::DEFAULT_HEAP_RETENTION,
        )
    }
}
