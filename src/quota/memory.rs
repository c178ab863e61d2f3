//! In-process quota store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::quota::store::{QuotaStore, StoreError};
use crate::quota::QuotaRecord;

/// Quota records held in a concurrent map.
///
/// Records live as long as the process. Separate instances do not see each
/// other's counts.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<DashMap<String, QuotaRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked client keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait::async_trait]
impl QuotaStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<QuotaRecord>, StoreError> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, record: &QuotaRecord, _now: DateTime<Utc>) -> Result<(), StoreError> {
        self.data.insert(record.client_key.clone(), record.clone());
        Ok(())
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut removed = 0;
        self.data.retain(|_, record| {
            let keep = !record.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
