//! Shared domain types for the gallery feed client.
//!
//! No I/O lives here: item records, viewing contexts, cursors and backoff
//! parameters used by the client, feed and viewer crates.

pub mod backoff;
pub mod context;
pub mod error;
pub mod item;
pub mod pagination;
pub mod types;
