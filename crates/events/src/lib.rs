//! Typed item-event bus for the gallery client.
//!
//! Components that show the same item (grid card, detail viewer, tag
//! editor) coordinate through [`EventBus`] instead of a process-wide
//! untyped dispatcher:
//!
//! - [`ItemEvent`] — `{ item_id, kind }` envelope.
//! - [`EventBus`] — publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ItemSubscription`] — a receiver scoped to a single item.

pub mod bus;

pub use bus::{EventBus, ItemEvent, ItemEventKind, ItemSubscription};
