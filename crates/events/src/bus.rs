//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`ItemEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` between the feed, the detail
//! viewer and the tag editor.

use chrono::{DateTime, Utc};
use gallery_core::types::ItemId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// ItemEvent
// ---------------------------------------------------------------------------

/// What happened to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemEventKind {
    Created,
    Modified,
    Deleted,
    /// The item's tag set was committed to the backend.
    TagsChanged,
}

/// A change to a single gallery item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEvent {
    pub item_id: ItemId,
    pub kind: ItemEventKind,
    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ItemEvent {
    pub fn new(item_id: ItemId, kind: ItemEventKind) -> Self {
        Self {
            item_id,
            kind,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`ItemEvent`].
///
/// # Usage
///
/// ```rust
/// use gallery_events::bus::{EventBus, ItemEvent, ItemEventKind};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ItemEvent::new(42, ItemEventKind::TagsChanged));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ItemEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it; zero is not an
    /// error.
    pub fn publish(&self, event: ItemEvent) -> usize {
        tracing::trace!(item_id = event.item_id, kind = ?event.kind, "Publishing item event");
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.sender.subscribe()
    }

    /// Subscribe to events for a single item only.
    pub fn subscribe_to(&self, item_id: ItemId) -> ItemSubscription {
        ItemSubscription {
            item_id,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// ItemSubscription
// ---------------------------------------------------------------------------

/// Receiver that yields only the events of one item.
pub struct ItemSubscription {
    item_id: ItemId,
    receiver: broadcast::Receiver<ItemEvent>,
}

impl ItemSubscription {
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Wait for the next event concerning this item.
    ///
    /// Lagged gaps are logged and skipped. Returns `None` once the bus is
    /// dropped.
    pub async fn recv(&mut self) -> Option<ItemEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.item_id == self.item_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        item_id = self.item_id,
                        skipped = n,
                        "Item subscription lagged, some events were dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(ItemEvent::new(42, ItemEventKind::TagsChanged));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.item_id, 42);
        assert_eq!(received.kind, ItemEventKind::TagsChanged);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(ItemEvent::new(1, ItemEventKind::Created)), 2);

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.item_id, 1);
        assert_eq!(e2.item_id, 1);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(ItemEvent::new(5, ItemEventKind::Deleted)), 0);
    }

    #[tokio::test]
    async fn item_subscription_skips_other_items() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe_to(7);

        bus.publish(ItemEvent::new(1, ItemEventKind::Modified));
        bus.publish(ItemEvent::new(7, ItemEventKind::TagsChanged));

        let event = sub.recv().await.expect("should receive item 7");
        assert_eq!(event.item_id, 7);
        assert_eq!(event.kind, ItemEventKind::TagsChanged);
    }

    #[tokio::test]
    async fn item_subscription_ends_when_bus_dropped() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe_to(7);
        drop(bus);
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn event_kind_serializes_snake_case() {
        let json = serde_json::to_value(ItemEvent::new(3, ItemEventKind::TagsChanged)).unwrap();
        assert_eq!(json["kind"], "tags_changed");
        assert_eq!(json["item_id"], 3);
    }
}
