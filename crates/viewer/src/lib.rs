//! Terminal host for the gallery feed.
//!
//! The binary wires a [`gallery_feed::FeedController`] to the REST API,
//! the realtime notifier and a line-oriented command prompt. This library
//! half holds the parts that do not need a terminal:
//!
//! - [`command`] — prompt command parser.
//! - [`context`] — maps commands onto viewing-context changes.
//! - [`render`] — plain-text formatting of items and feed state.
//! - [`session`] — anonymous fallback after a rejected session.

pub mod command;
pub mod context;
pub mod render;
pub mod session;
