//! Per-client daily quota.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_key.rs (client-ip / x-forwarded-for / x-real-ip → key)
//!     → QuotaLimiter::get_or_create (self-heals expired windows)
//!     → is_exceeded? → 429
//!     → ... upstream succeeds ...
//!     → QuotaLimiter::increment
//!
//! Background:
//!     sweeper.rs → QuotaStore::sweep (hourly housekeeping)
//! ```
//!
//! # Design Decisions
//! - The window is a rolling 24h anchored at the first request after reset,
//!   not a calendar day
//! - Only successful generations count
//! - Stores are swappable: in-process map or Redis

pub mod client_key;
pub mod clock;
pub mod memory;
pub mod redis_store;
pub mod store;
pub mod sweeper;

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize, Serializer};

pub use client_key::{client_key, UNKNOWN_CLIENT};
pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{QuotaStore, StoreError};
pub use sweeper::QuotaSweeper;

use crate::config::{QuotaConfig, StoreKind};

/// Usage counter for one client key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub client_key: String,
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

impl QuotaRecord {
    /// A zeroed record whose window starts at `now`.
    pub fn fresh(client_key: &str, now: DateTime<Utc>, window: TimeDelta) -> Self {
        Self {
            client_key: client_key.to_string(),
            count: 0,
            reset_at: now
                .checked_add_signed(window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_at
    }

    pub fn is_exceeded(&self, limit: u32) -> bool {
        self.count >= limit
    }
}

/// Limit and window applied to every client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub limit: u32,
    pub window: TimeDelta,
}

impl QuotaPolicy {
    pub fn new(limit: u32, window: TimeDelta) -> Self {
        Self { limit, window }
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::new(100, TimeDelta::hours(24))
    }
}

impl From<&QuotaConfig> for QuotaPolicy {
    fn from(config: &QuotaConfig) -> Self {
        let window = TimeDelta::from_std(config.window()).unwrap_or(TimeDelta::MAX);
        Self::new(config.daily_limit, window)
    }
}

/// Quota state as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSnapshot {
    pub limit: u32,
    pub remaining: u32,
    pub used: u32,
    #[serde(serialize_with = "serialize_iso8601")]
    pub reset_at: DateTime<Utc>,
    /// Whole seconds until `reset_at`, never negative.
    pub reset_in: i64,
}

impl QuotaSnapshot {
    pub fn new(record: &QuotaRecord, limit: u32, now: DateTime<Utc>) -> Self {
        Self {
            limit,
            remaining: limit.saturating_sub(record.count),
            used: record.count,
            reset_at: record.reset_at,
            reset_in: (record.reset_at - now).num_seconds().max(0),
        }
    }

    /// `reset_at` as ISO-8601 with millisecond precision, e.g. `2026-10-20T08:00:00.000Z`.
    pub fn reset_at_iso(&self) -> String {
        iso8601(&self.reset_at)
    }

    /// Time left in the window as whole (hours, minutes).
    pub fn reset_in_hours_minutes(&self) -> (i64, i64) {
        (self.reset_in / 3600, (self.reset_in % 3600) / 60)
    }
}

pub(crate) fn iso8601(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_iso8601<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&iso8601(at))
}

/// Counts successful generations per client key against a [`QuotaPolicy`].
#[derive(Clone)]
pub struct QuotaLimiter {
    store: Arc<dyn QuotaStore>,
    clock: Arc<dyn Clock>,
    policy: QuotaPolicy,
}

impl QuotaLimiter {
    pub fn new(store: Arc<dyn QuotaStore>, policy: QuotaPolicy) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            policy,
        }
    }

    /// Build the limiter and store described by the configuration.
    pub fn from_config(config: &QuotaConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn QuotaStore> = match config.store {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            StoreKind::Redis => Arc::new(RedisStore::new(
                config.redis_url.as_deref().unwrap_or_default(),
                config.redis_key_prefix.clone(),
            )?),
        };
        tracing::info!(
            store = ?config.store,
            limit = config.daily_limit,
            window_secs = config.window_secs,
            "Quota limiter initialized"
        );
        Ok(Self::new(store, QuotaPolicy::from(config)))
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> QuotaPolicy {
        self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current record for `key`, starting a new window if the old one has ended.
    pub async fn get_or_create(&self, key: &str) -> Result<QuotaRecord, StoreError> {
        let now = self.clock.now();
        match self.store.get(key).await? {
            Some(record) if !record.is_expired(now) => Ok(record),
            _ => {
                let record = QuotaRecord::fresh(key, now, self.policy.window);
                self.store.set(&record, now).await?;
                Ok(record)
            }
        }
    }

    /// Count one use against `key`.
    pub async fn increment(&self, key: &str) -> Result<QuotaRecord, StoreError> {
        let mut record = self.get_or_create(key).await?;
        record.count = record.count.saturating_add(1);
        self.store.set(&record, self.clock.now()).await?;
        Ok(record)
    }

    pub fn is_exceeded(&self, record: &QuotaRecord) -> bool {
        record.is_exceeded(self.policy.limit)
    }

    pub fn snapshot(&self, record: &QuotaRecord) -> QuotaSnapshot {
        QuotaSnapshot::new(record, self.policy.limit, self.clock.now())
    }

    /// Drop expired records from the store.
    pub async fn sweep(&self) -> Result<usize, StoreError> {
        self.store.sweep(self.clock.now()).await
    }
}
