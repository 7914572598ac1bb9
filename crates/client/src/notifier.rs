//! Long-running realtime notifier connection.
//!
//! [`RealtimeNotifier`] keeps one websocket connection to the backend
//! alive: it spawns a task that connects, processes messages, and
//! reconnects with backoff whenever the connection drops.
//!
//! Events are broadcast via a [`tokio::sync::broadcast`] channel. Call
//! [`RealtimeNotifier::subscribe`] to receive them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gallery_core::backoff::BackoffConfig;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use crate::client::{NotifierClient, NotifierConnection};
use crate::events::NotifierEvent;
use crate::processor::{process_messages, StreamEnd};
use crate::reconnect::reconnect_loop;

/// Broadcast channel capacity for notifier events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long [`RealtimeNotifier::shutdown`] waits for the task to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the background connection task for the realtime notifier.
pub struct RealtimeNotifier {
    event_tx: broadcast::Sender<NotifierEvent>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
    task_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl RealtimeNotifier {
    /// Spawn the connection task and return a shared handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(client: NotifierClient, backoff: BackoffConfig) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let connected = Arc::new(AtomicBool::new(false));

        let task_tx = event_tx.clone();
        let task_cancel = cancel.clone();
        let task_connected = Arc::clone(&connected);

        let task_handle = tokio::spawn(async move {
            tracing::info!(ws_url = %client.ws_url(), "Starting notifier task");
            run_connection_loop(&client, &backoff, &task_tx, &task_connected, &task_cancel).await;
            tracing::info!("Notifier task exited");
        });

        Arc::new(Self {
            event_tx,
            connected,
            cancel,
            task_handle: Mutex::new(Some(task_handle)),
        })
    }

    /// Subscribe to notifier events.
    pub fn subscribe(&self) -> broadcast::Receiver<NotifierEvent> {
        self.event_tx.subscribe()
    }

    /// `true` while a websocket session is active.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Stop the connection task and wait briefly for it to exit.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down realtime notifier");
        self.cancel.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
                tracing::warn!("Notifier task did not exit within the shutdown timeout");
            }
        }
    }
}

impl Drop for RealtimeNotifier {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Core connection loop: connect -> process messages -> reconnect.
///
/// Runs until the cancellation token is triggered.
async fn run_connection_loop(
    client: &NotifierClient,
    backoff: &BackoffConfig,
    event_tx: &broadcast::Sender<NotifierEvent>,
    connected: &AtomicBool,
    cancel: &CancellationToken,
) {
    let mut pending: Option<NotifierConnection> = tokio::select! {
        _ = cancel.cancelled() => return,
        result = client.connect() => match result {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::warn!(error = %e, "Notifier connection failed, entering reconnect loop");
                None
            }
        },
    };

    loop {
        let conn = match pending.take() {
            Some(conn) => conn,
            None => match reconnect_loop(client, backoff, cancel).await {
                Some(conn) => conn,
                None => return, // cancelled
            },
        };

        connected.store(true, Ordering::Release);
        let _ = event_tx.send(NotifierEvent::Connected);

        let mut ws_stream = conn.ws_stream;
        let end = process_messages(&mut ws_stream, event_tx, cancel).await;

        connected.store(false, Ordering::Release);
        let _ = event_tx.send(NotifierEvent::Disconnected);

        if end == StreamEnd::Cancelled || cancel.is_cancelled() {
            let _ = ws_stream.close(None).await;
            return;
        }

        tracing::info!(?end, "Notifier connection lost, entering reconnect loop");
    }
}
