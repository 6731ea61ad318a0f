//! In-Memory Store Module
//!
//! A [`LinkStore`] backed by a `HashMap` behind an async `RwLock`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::error::{LinkError, Result};
use crate::store::{ExpiryPolicy, LinkRecord, LinkStore};

// == Memory Store ==
/// Process-local link store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, LinkRecord>>,
    /// When set, every call fails with `StoreUnavailable`
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(LinkError::StoreUnavailable(
                "memory store switched off".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl LinkStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<LinkRecord>> {
        self.check_available()?;
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, record: LinkRecord) -> Result<()> {
        self.check_available()?;
        self.records.write().await.insert(record.key.clone(), record);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn increment_counter(&self, key: &str) -> Result<Option<u64>> {
        self.check_available()?;
        let mut records = self.records.write().await;
        match records.get_mut(key).map(|r| &mut r.policy) {
            Some(ExpiryPolicy::Clicks { clicks, .. }) => {
                *clicks += 1;
                Ok(Some(*clicks))
            }
            _ => Ok(None),
        }
    }

    async fn find_by_value(&self, value: &str) -> Result<Option<LinkRecord>> {
        self.check_available()?;
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.value == value)
            .cloned())
    }
}
