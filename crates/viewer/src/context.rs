//! Viewing-context transitions.
//!
//! Every command that changes sort, search or filters yields a new
//! [`ViewingContext`]; the caller must reset the feed with it before the
//! next fetch. Commands that leave the context unchanged yield `None` so
//! the loaded feed is kept.

use gallery_core::context::ViewingContext;

use crate::command::Command;

/// The context `command` asks for, or `None` when it would not change.
pub fn next_context(current: &ViewingContext, command: &Command) -> Option<ViewingContext> {
    let mut next = current.clone();
    match command {
        Command::Sort(key, Some(direction)) => {
            next.sort_key = *key;
            next.sort_direction = *direction;
        }
        // Re-selecting the active key flips the direction.
        Command::Sort(key, None) if *key == current.sort_key => {
            next.sort_direction = current.sort_direction.reversed();
        }
        Command::Sort(key, None) => next.sort_key = *key,
        Command::Search(Some(term)) => next.set_search(term),
        Command::Search(None) => next.clear_search(),
        Command::Filter(id) => {
            next.toggle_filter(*id);
        }
        _ => return None,
    }
    (next != *current).then_some(next)
}
