//! Cache Module
//!
//! Fixed-capacity LRU cache for resolved short links.

mod bounded;
mod stats;


// Re-export public types
pub use bounded::BoundedCache;
pub use stats::CacheStats;

// == Public Constants ==
/// Default number of cached links
pub const DEFAULT_CAPACITY: usize = 100;
