//! Schedule Module
//!
//! Priority-ordered expiry tracking for time-bounded links.

mod entry;
mod heap;


pub use entry::ExpiryEntry;
pub use heap::ExpiryScheduler;
