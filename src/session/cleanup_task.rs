use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::memory_store::InMemorySessionStore;

/// Periodically purges expired sessions from the in-memory store until `shutdown` fires
#[instrument(skip(store, shutdown))]
pub async fn start_session_sweeper(
    store: Arc<InMemorySessionStore>,
    sweep_interval: Duration,
    shutdown: CancellationToken,
) {
    info!(
        sweep_interval_secs = sweep_interval.as_secs(),
        "Starting session sweeper background task"
    );

    let mut ticker = interval(sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Session sweeper stopped");
                break;
            }
            _ = ticker.tick() => {
                let removed = store.purge_expired().await;
                if removed > 0 {
                    info!(removed_count = removed, "Session sweep completed");
                } else {
                    debug!("No expired sessions to sweep");
                }
            }
        }
    }
}
