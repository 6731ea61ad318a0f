//! Store Module
//!
//! The durable link store consumed by the coordinator. The core only ever
//! reaches it through [`LinkStore`]; [`MemoryStore`] is the in-process
//! implementation used by the server binary and the tests.

mod memory;
mod record;

use std::future::Future;

pub use memory::MemoryStore;
pub use record::{ExpiryPolicy, ExpiryReason, LinkRecord};

use crate::error::Result;

// == Link Store ==
/// Key-indexed persistent link storage.
///
/// Every call is independently atomic; nothing more is assumed. Failures
/// surface as [`LinkError::StoreUnavailable`](crate::error::LinkError).
pub trait LinkStore: Send + Sync + 'static {
    /// Fetches the record for `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<LinkRecord>>> + Send;

    /// Creates or replaces a record.
    fn put(&self, record: LinkRecord) -> impl Future<Output = Result<()>> + Send;

    /// Deletes a record. Returns false if it was already absent.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Bumps the click counter of a click-limited record.
    ///
    /// Returns the new count, or `None` if the record is absent or not
    /// click-limited.
    fn increment_counter(&self, key: &str) -> impl Future<Output = Result<Option<u64>>> + Send;

    /// Reverse lookup: any record whose target equals `value`.
    fn find_by_value(&self, value: &str) -> impl Future<Output = Result<Option<LinkRecord>>> + Send;
}
