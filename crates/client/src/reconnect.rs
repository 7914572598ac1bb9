//! Exponential-backoff reconnection for the notifier websocket.
//!
//! When the connection drops, the notifier task calls [`reconnect_loop`]
//! to keep retrying with increasing delays until either the connection
//! is restored or the [`CancellationToken`] is triggered.

use std::time::Duration;

use gallery_core::backoff::BackoffConfig;
use tokio_util::sync::CancellationToken;

use crate::client::{NotifierClient, NotifierConnection};

/// Backoff used for notifier reconnection: 3 s, doubling, capped at 30 s.
pub fn default_reconnect_backoff() -> BackoffConfig {
    BackoffConfig {
        initial_delay: Duration::from_secs(3),
        max_delay: Duration::from_secs(30),
        multiplier: 2.0,
    }
}

/// Attempt to reconnect to the notifier with exponential backoff.
///
/// Waits `initial_delay` before the first attempt. Returns
/// `Some(connection)` once a connection succeeds, or `None` if the
/// `cancel` token is triggered first.
pub async fn reconnect_loop(
    client: &NotifierClient,
    config: &BackoffConfig,
    cancel: &CancellationToken,
) -> Option<NotifierConnection> {
    let mut attempt = 0u32;

    for delay in config.delays() {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Notifier reconnect cancelled");
                return None;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
        tracing::info!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting to realtime notifier",
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Notifier reconnect cancelled");
                return None;
            }
            result = client.connect() => {
                match result {
                    Ok(conn) => {
                        tracing::info!(attempt, "Reconnected to realtime notifier");
                        return Some(conn);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Reconnect attempt {attempt} failed");
                    }
                }
            }
        }
    }

    // `delays()` never ends; reaching here means the iterator was exhausted.
    None
}
