//! services/api/src/sweeper.rs
//!
//! Background task that deletes expired sessions. Lookups already treat an
//! expired session as absent, so the sweep only reclaims storage and can never
//! remove a session that a concurrent lookup would still return.

use chrono::Utc;
use lesson_tracker_core::ports::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Purges expired sessions every `interval` until `cancellation_token` fires.
pub async fn sweep_expired_sessions(
    sessions: Arc<dyn SessionStore>,
    interval: Duration,
    cancellation_token: CancellationToken,
) {
    info!("Session sweeper started.");
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; skip it so startup is not a sweep.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Session sweeper cancelled.");
                return;
            }
            _ = ticker.tick() => {
                match sessions.purge_expired(Utc::now()).await {
                    Ok(0) => {}
                    Ok(purged) => debug!(purged, "Purged expired sessions"),
                    Err(e) => error!("Failed to purge expired sessions: {:?}", e),
                }
            }
        }
    }
}
