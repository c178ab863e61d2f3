//! Storage abstraction for quota records.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::quota::QuotaRecord;

/// Errors raised by a quota store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis connection or command failed.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored record could not be (de)serialized.
    #[error("Corrupt quota record for '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Backend holding one [`QuotaRecord`] per client key.
///
/// Implementations only store and fetch; window expiry and counting live in
/// [`QuotaLimiter`](crate::quota::QuotaLimiter).
#[async_trait::async_trait]
pub trait QuotaStore: Send + Sync {
    /// Get the record for a key, returns None if it doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<QuotaRecord>, StoreError>;

    /// Insert or replace the record under its `client_key`. `now` is the
    /// limiter's current time, for backends that derive an expiry from it.
    async fn set(&self, record: &QuotaRecord, now: DateTime<Utc>) -> Result<(), StoreError>;

    /// Drop every record whose window ended before `now`. Returns how many were removed.
    async fn sweep(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}
