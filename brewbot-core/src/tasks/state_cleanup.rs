// src/tasks/state_cleanup.rs

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use brewbot_common::traits::repository_traits::ClaimStateRepository;

/// Spawns the retention sweep: rows whose `ttl_at` has passed get dropped.
/// A row only reaches its horizon a full period after going stale, so
/// nothing the reconciler still consults is ever purged.
pub fn spawn_state_cleanup_task(
    store: Arc<dyn ClaimStateRepository>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match store.purge_expired().await {
                Ok(0) => debug!("State cleanup: nothing to purge."),
                Ok(n) => info!("State cleanup: purged {} stale row(s).", n),
                Err(e) => error!("State cleanup failed: {:?}", e),
            }
        }
    })
}
