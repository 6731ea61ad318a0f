//! Operation Record Module
//!
//! Defines the immutable records appended to the event logs.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Operation Kind ==
/// Every kind of operation the core can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    Set,
    Hit,
    Miss,
    Evict,
    Expired,
    Dedup,
    HeapInsert,
    HeapExtract,
}

impl OperationKind {
    /// Returns the log this kind of record is appended to.
    pub fn category(self) -> LogCategory {
        match self {
            OperationKind::HeapInsert | OperationKind::HeapExtract => LogCategory::Heap,
            OperationKind::Set
            | OperationKind::Hit
            | OperationKind::Miss
            | OperationKind::Evict
            | OperationKind::Expired
            | OperationKind::Dedup => LogCategory::Cache,
        }
    }

    /// Wire name of the kind, e.g. `HEAP_INSERT`.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Set => "SET",
            OperationKind::Hit => "HIT",
            OperationKind::Miss => "MISS",
            OperationKind::Evict => "EVICT",
            OperationKind::Expired => "EXPIRED",
            OperationKind::Dedup => "DEDUP",
            OperationKind::HeapInsert => "HEAP_INSERT",
            OperationKind::HeapExtract => "HEAP_EXTRACT",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Log Category ==
/// The independent retention buffers kept by the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Cache,
    Heap,
}

impl FromStr for LogCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cache" => Ok(LogCategory::Cache),
            "heap" => Ok(LogCategory::Heap),
            other => Err(format!("Unknown log category '{}'", other)),
        }
    }
}

// == Operation Record ==
/// A single logged operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRecord {
    pub kind: OperationKind,
    pub key: String,
    /// Time spent inside the operation, in nanoseconds
    pub duration_ns: u64,
    /// Informational complexity label, e.g. "O(1)"
    pub complexity: &'static str,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
    /// Size of the owning container when the record was taken
    pub size: usize,
}

impl OperationRecord {
    // == Constructor ==
    /// Creates a record stamped with the current wall-clock time.
    pub fn new(
        kind: OperationKind,
        key: impl Into<String>,
        elapsed: Duration,
        complexity: &'static str,
        detail: impl Into<String>,
        size: usize,
    ) -> Self {
        Self {
            kind,
            key: key.into(),
            duration_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            complexity,
            detail: detail.into(),
            timestamp: Utc::now(),
            size,
        }
    }

    /// Returns the log this record belongs to.
    pub fn category(&self) -> LogCategory {
        self.kind.category()
    }
}
