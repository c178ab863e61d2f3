//! Redis-backed quota store for deployments running several instances.

use chrono::{DateTime, Utc};
use redis::AsyncCommands;

use crate::quota::store::{QuotaStore, StoreError};
use crate::quota::QuotaRecord;

/// Records are stored as JSON under `<prefix>:<client_key>` with a TTL that
/// outlives `reset_at`, so Redis expires them on its own.
pub struct RedisStore {
    client: redis::Client,
    prefix: String,
}

impl RedisStore {
    /// url: "redis://127.0.0.1:6379"
    pub fn new(url: &str, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            prefix: prefix.into(),
        })
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

/// Seconds until `reset_at`, plus one so the key never expires early.
fn ttl_secs(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (reset_at - now).num_seconds().max(0) as u64 + 1
}

#[async_trait::async_trait]
impl QuotaStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<QuotaRecord>, StoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(self.build_key(key)).await?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    async fn set(&self, record: &QuotaRecord, now: DateTime<Utc>) -> Result<(), StoreError> {
        let json = serde_json::to_string(record).map_err(|source| StoreError::Corrupt {
            key: record.client_key.clone(),
            source,
        })?;
        let ttl = ttl_secs(record.reset_at, now);

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(self.build_key(&record.client_key), json, ttl)
            .await?;
        Ok(())
    }

    async fn sweep(&self, _now: DateTime<Utc>) -> Result<usize, StoreError> {
        // Keys carry their own TTL.
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_key_layout() {
        let store = RedisStore::new("redis://127.0.0.1:6379", "quota").unwrap();
        assert_eq!(store.build_key("1.2.3.4"), "quota:1.2.3.4");
    }

    #[test]
    fn test_ttl_outlives_reset() {
        let now = Utc::now();
        assert_eq!(ttl_secs(now + TimeDelta::seconds(86_400), now), 86_401);
        assert_eq!(ttl_secs(now - TimeDelta::seconds(5), now), 1);
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(matches!(
            RedisStore::new("not a url", "quota"),
            Err(StoreError::Redis(_))
        ));
    }
}
