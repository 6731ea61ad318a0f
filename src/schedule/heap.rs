//! Expiry Scheduler Module
//!
//! Array-backed binary min-heap of [`ExpiryEntry`] values keyed by instant.
//!
//! | Operation     | Complexity |
//! |---------------|------------|
//! | `insert`      | O(log n)   |
//! | `peek_min`    | O(1)       |
//! | `extract_min` | O(log n)   |
//! | `remove`      | O(n)       |
//! | `snapshot`    | O(n log n) |

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::events::{EventRecorder, OperationKind};
use crate::schedule::ExpiryEntry;

// == Expiry Scheduler ==
/// Min-heap of expiry instants. The root is always the next key to expire.
pub struct ExpiryScheduler {
    heap: Vec<ExpiryEntry>,
    next_seq: u64,
    recorder: Arc<EventRecorder>,
}

impl ExpiryScheduler {
    // == Constructor ==
    pub fn new(recorder: Arc<EventRecorder>) -> Self {
        Self {
            heap: Vec::new(),
            next_seq: 0,
            recorder,
        }
    }

    // == Insert ==
    /// Schedules `key` to expire at `expires_at`.
    pub fn insert(&mut self, key: impl Into<String>, expires_at: DateTime<Utc>) {
        let start = Instant::now();
        let entry = ExpiryEntry::new(key, expires_at, self.next_seq);
        self.next_seq += 1;

        let key = entry.key.clone();
        self.heap.push(entry);
        self.sift_up(self.heap.len() - 1);
        self.debug_check();

        self.recorder.record(
            OperationKind::HeapInsert,
            &key,
            start.elapsed(),
            "O(log n)",
            format!("expires at {}", expires_at.to_rfc3339()),
            self.heap.len(),
        );
    }

    // == Peek Min ==
    /// Returns the entry that expires first without removing it.
    pub fn peek_min(&self) -> Option<&ExpiryEntry> {
        self.heap.first()
    }

    // == Extract Min ==
    /// Removes and returns the entry that expires first.
    pub fn extract_min(&mut self) -> Option<ExpiryEntry> {
        let start = Instant::now();
        if self.heap.is_empty() {
            return None;
        }

        let min = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        self.debug_check();

        self.recorder.record(
            OperationKind::HeapExtract,
            &min.key,
            start.elapsed(),
            "O(log n)",
            format!("expired at {}", min.expires_at.to_rfc3339()),
            self.heap.len(),
        );
        Some(min)
    }

    // == Remove ==
    /// Removes the entry for `key`, wherever it sits in the heap.
    ///
    /// Returns true if an entry was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let start = Instant::now();
        let Some(index) = self.heap.iter().position(|e| e.key == key) else {
            return false;
        };

        self.heap.swap_remove(index);
        if index < self.heap.len() {
            // The relocated entry may belong above or below its new slot.
            self.sift_up(index);
            self.sift_down(index);
        }
        self.debug_check();

        self.recorder.record(
            OperationKind::HeapExtract,
            key,
            start.elapsed(),
            "O(n)",
            "removed",
            self.heap.len(),
        );
        true
    }

    // == Snapshot ==
    /// Returns all entries ordered by expiry instant ascending.
    pub fn snapshot(&self) -> Vec<ExpiryEntry> {
        let mut entries = self.heap.clone();
        entries.sort();
        entries
    }

    pub fn contains(&self, key: &str) -> bool {
        self.heap.iter().any(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    // == Heap Maintenance ==
    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[index] < self.heap[parent] {
                self.heap.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            if left >= len {
                break;
            }

            let smaller = if right < len && self.heap[right] < self.heap[left] {
                right
            } else {
                left
            };

            if self.heap[smaller] < self.heap[index] {
                self.heap.swap(smaller, index);
                index = smaller;
            } else {
                break;
            }
        }
    }

    /// Checks that every parent expires no later than its children.
    pub fn is_valid_heap(&self) -> bool {
        (1..self.heap.len()).all(|i| self.heap[(i - 1) / 2] <= self.heap[i])
    }

    fn debug_check(&self) {
        debug_assert!(self.is_valid_heap(), "heap property violated");
    }
}
