//! Periodic sync

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use quotebox_store::{QuoteStore, RemoteSource, StoreError};

/// Runs `QuoteStore::sync` immediately and then once per interval until stopped.
pub struct SyncScheduler {
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: QuoteStore, remote: Arc<dyn RemoteSource>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match store.sync(remote.as_ref()).await {
                    Ok(report) => tracing::debug!(
                        total = report.total,
                        added = report.added,
                        "Periodic sync finished"
                    ),
                    Err(StoreError::SyncInProgress) => {
                        tracing::debug!("Skipping periodic sync, another sync is running")
                    }
                    Err(e) => tracing::warn!(error = %e, "Periodic sync failed"),
                }
            }
        });

        tracing::info!(interval_secs = period.as_secs(), "Started periodic sync");

        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        // Drop aborts the task
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!("Stopped periodic sync");
    }
}
