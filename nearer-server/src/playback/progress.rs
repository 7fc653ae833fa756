//! Periodic progress updates
//!
//! While something is playing, publishes a `status` event carrying elapsed
//! time and duration so clients can draw a progress bar without polling.

use super::QueueManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Spawn the progress ticker
///
/// Returns `None` (and spawns nothing) when `interval` is zero.
pub fn spawn_progress_ticker(
    manager: Arc<QueueManager>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        info!("Progress updates disabled");
        return None;
    }

    info!(interval_secs = interval.as_secs_f64(), "Progress updates enabled");
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            manager.publish_progress().await;
        }
    }))
}
