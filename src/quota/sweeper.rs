//! Periodic removal of expired quota records.
//!
//! Expired records are already replaced on access, so the sweep only bounds
//! memory held by clients that never come back.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::observability::metrics;
use crate::quota::QuotaLimiter;

pub struct QuotaSweeper {
    limiter: QuotaLimiter,
    interval: Duration,
}

impl QuotaSweeper {
    pub fn new(limiter: QuotaLimiter, interval: Duration) -> Self {
        Self { limiter, interval }
    }

    /// Start sweeping in the background until `shutdown` fires.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Quota sweeper starting");

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Quota sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run a single sweep, logging failures instead of returning them.
    pub async fn sweep_once(&self) -> usize {
        match self.limiter.sweep().await {
            Ok(removed) => {
                if removed > 0 {
                    tracing::debug!(removed, "Swept expired quota records");
                }
                metrics::record_quota_swept(removed);
                removed
            }
            Err(e) => {
                tracing::error!(error = %e, "Quota sweep failed");
                0
            }
        }
    }
}
