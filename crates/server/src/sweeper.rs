//! Periodic removal of expired staging directories.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use driveseed_core::StagingArea;

use crate::metrics::STAGING_SWEPT_TOTAL;

/// Sweep cadence derived from the retention period, bounded to 1 min..=1 h.
pub fn sweep_interval(retention: Duration) -> Duration {
    (retention / 4).clamp(Duration::from_secs(60), Duration::from_secs(3600))
}

/// Spawns a task that removes staging directories older than `retention`
/// every `interval`. The first sweep runs immediately.
pub fn spawn_sweeper(staging: StagingArea, retention: Duration, interval: Duration) -> JoinHandle<()> {
    info!(
        root = %staging.root().display(),
        retention_secs = retention.as_secs(),
        interval_secs = interval.as_secs(),
        "Starting staging sweeper"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match staging.sweep_older_than(retention).await {
                Ok(removed) => STAGING_SWEPT_TOTAL.inc_by(removed as u64),
                Err(e) => warn!(path = ?e.path(), error = %e, "Staging sweep failed"),
            }
        }
    })
}
