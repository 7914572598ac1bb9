//! Viewport-sentinel driver.
//!
//! The host sends `()` on a channel every time the sentinel element at the
//! end of the rendered list becomes visible. [`run`] turns each edge into a
//! [`FeedController::fetch_next`] call on a background task and reports
//! what happened. Edges that arrive while a fetch is in flight are skipped
//! by the controller's guard and are not reported.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::controller::{FeedController, FetchOutcome};
use crate::error::FeedError;
use crate::source::ItemSource;

/// Outcome of one sentinel-triggered fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverReport {
    Fetched(FetchOutcome),
    Failed(FeedError),
}

/// Run until `cancel` fires or the sentinel channel closes.
///
/// Every edge spawns a fetch; the controller's guard decides whether it
/// reaches the backend. Fetches still running at shutdown are aborted and
/// awaited, so the controller's in-flight flag is released before this
/// returns.
pub async fn run<S: ItemSource + 'static>(
    controller: Arc<FeedController<S>>,
    mut sentinel: mpsc::Receiver<()>,
    reports: mpsc::Sender<DriverReport>,
    cancel: CancellationToken,
) {
    let mut fetches = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Sentinel driver cancelled");
                break;
            }
            Some(joined) = fetches.join_next(), if !fetches.is_empty() => {
                if let Err(e) = joined {
                    tracing::warn!(error = %e, "Fetch task ended abnormally");
                }
            }
            edge = sentinel.recv() => {
                if edge.is_none() {
                    tracing::debug!("Sentinel channel closed, driver stopping");
                    break;
                }
                fetches.spawn(fetch_and_report(Arc::clone(&controller), reports.clone()));
            }
        }
    }

    fetches.shutdown().await;
}

async fn fetch_and_report<S: ItemSource + 'static>(
    controller: Arc<FeedController<S>>,
    reports: mpsc::Sender<DriverReport>,
) {
    let report = match controller.fetch_next().await {
        Ok(FetchOutcome::Skipped) => return,
        Ok(outcome) => DriverReport::Fetched(outcome),
        Err(e) => DriverReport::Failed(e),
    };
    if reports.send(report).await.is_err() {
        tracing::debug!("Driver report receiver dropped");
    }
}
