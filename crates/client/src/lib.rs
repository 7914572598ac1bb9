//! REST and websocket client library for the gallery backend.
//!
//! Provides the item/tag HTTP API wrapper, environment configuration,
//! websocket connection management for the realtime notifier, typed
//! message parsing, reconnection logic, and the notifier task that
//! broadcasts [`events::NotifierEvent`]s to the rest of the client.

pub mod api;
pub mod client;
pub mod config;
pub mod events;
pub mod messages;
pub mod notifier;
pub mod processor;
pub mod reconnect;
