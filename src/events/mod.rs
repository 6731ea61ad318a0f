//! Events Module
//!
//! Bounded, append-only operation logs used for observability.

mod record;
mod recorder;

pub use record::{LogCategory, OperationKind, OperationRecord};
pub use recorder::EventRecorder;

// == Public Constants ==
/// Default number of cache-category records retained
pub const DEFAULT_CACHE_RETENTION: usize = 100;

/// Default number of heap-category records retained
pub const DEFAULT_HEAP_RETENTION: usize = 50;
