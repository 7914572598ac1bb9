//! Cursor-paginated gallery feed.
//!
//! [`FeedController`] is the single owner of the client-visible item list:
//! it guards against overlapping page fetches, merges pages without
//! duplicates, and discards pages that arrive after a reset. The other
//! modules are the host-side plumbing around it:
//!
//! - [`source`] — async seams to the backend item API.
//! - [`driver`] — turns viewport-sentinel edges into page fetches.
//! - [`live`] — refreshes single items on realtime notifications.
//! - [`tags`] — optimistic tag editing with authoritative rollback.
//! - [`retry`] — bounded, cancellable exponential backoff.

pub mod controller;
pub mod driver;
pub mod error;
pub mod live;
pub mod retry;
pub mod source;
pub mod state;
pub mod tags;

pub use controller::{FeedController, FeedSnapshot, FetchOutcome};
pub use error::FeedError;
pub use source::{ItemLookup, ItemSource};
