//! Live item refreshes driven by realtime notifications.
//!
//! [`LiveRefresher`] listens to the notifier's broadcast stream and turns
//! item notifications into [`LiveUpdate`]s for whoever is showing those
//! items. It never touches a [`FeedController`](crate::FeedController):
//! splicing refreshed items into a feed is the host's call.

use std::sync::Arc;

use gallery_client::events::NotifierEvent;
use gallery_core::item::Item;
use gallery_core::types::ItemId;
use gallery_events::{EventBus, ItemEvent, ItemEventKind};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::error::FeedError;
use crate::retry::{retry, RetryError, RetryPolicy};
use crate::source::ItemLookup;

const UPDATE_CHANNEL_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub enum LiveUpdate {
    /// Fresh copy of an item that was created, modified or moved.
    Refreshed(Item),
    /// The item no longer exists on the backend.
    Removed(ItemId),
}

impl LiveUpdate {
    pub fn item_id(&self) -> ItemId {
        match self {
            LiveUpdate::Refreshed(item) => item.id,
            LiveUpdate::Removed(id) => *id,
        }
    }
}

pub struct LiveRefresher<L> {
    lookup: L,
    bus: Arc<EventBus>,
    updates_tx: broadcast::Sender<LiveUpdate>,
    retry: RetryPolicy,
}

impl<L: ItemLookup> LiveRefresher<L> {
    pub fn new(lookup: L, bus: Arc<EventBus>) -> Self {
        let (updates_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            lookup,
            bus,
            updates_tx,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveUpdate> {
        self.updates_tx.subscribe()
    }

    /// Consume notifier events until the channel closes or `cancel` fires.
    pub async fn run(
        &self,
        mut receiver: broadcast::Receiver<NotifierEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Live refresher cancelled");
                    break;
                }
                received = receiver.recv() => received,
            };

            match received {
                Ok(event) => {
                    self.handle(&event, &cancel).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Live refresher lagged, some notifications were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Notifier closed, live refresher shutting down");
                    break;
                }
            }
        }
    }

    /// Handle one notification. Returns the update that was broadcast, if
    /// any.
    pub async fn handle(
        &self,
        event: &NotifierEvent,
        cancel: &CancellationToken,
    ) -> Option<LiveUpdate> {
        let item_id = event.item_id()?;

        let update = match event {
            NotifierEvent::ItemDeleted { .. } => {
                self.bus
                    .publish(ItemEvent::new(item_id, ItemEventKind::Deleted));
                LiveUpdate::Removed(item_id)
            }
            NotifierEvent::ItemCreated { .. }
            | NotifierEvent::ItemModified { .. }
            | NotifierEvent::ItemMoved { .. } => {
                let kind = match event {
                    NotifierEvent::ItemCreated { .. } => ItemEventKind::Created,
                    _ => ItemEventKind::Modified,
                };
                match self.refresh(item_id, cancel).await? {
                    Some(item) => {
                        self.bus.publish(ItemEvent::new(item_id, kind));
                        LiveUpdate::Refreshed(item)
                    }
                    None => {
                        self.bus
                            .publish(ItemEvent::new(item_id, ItemEventKind::Deleted));
                        LiveUpdate::Removed(item_id)
                    }
                }
            }
            NotifierEvent::Connected | NotifierEvent::Disconnected => return None,
        };

        let _ = self.updates_tx.send(update.clone());
        Some(update)
    }

    /// Fetch `item_id` with retries. `Some(None)` means the backend says it
    /// is gone; `None` means the lookup was abandoned.
    async fn refresh(&self, item_id: ItemId, cancel: &CancellationToken) -> Option<Option<Item>> {
        let lookup = &self.lookup;
        let result = retry(&self.retry, cancel, move |_| async move {
            match lookup.fetch_item(item_id).await {
                Err(FeedError::Transport {
                    status: Some(404), ..
                }) => Ok(None),
                other => other.map(Some),
            }
        })
        .await;

        match result {
            Ok(item) => Some(item),
            Err(RetryError::Cancelled) => None,
            Err(RetryError::Exhausted { attempts, last }) => {
                tracing::warn!(item_id, attempts, error = %last, "Failed to refresh item");
                None
            }
        }
    }
}
