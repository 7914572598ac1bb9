//! Plain-text rendering for the prompt.

use gallery_core::item::{Item, Tag};
use gallery_feed::FeedSnapshot;

/// One line per item: id, filename and creation date when present.
pub fn item_line(item: &Item) -> String {
    let mut line = format!("#{:<8}", item.id);
    line.push_str(item.filename().unwrap_or("<unnamed>"));
    if item.is_video() {
        line.push_str(" [video]");
    }
    if let Some(created) = item.date_created() {
        line.push_str(&format!("  {}", created.format("%Y-%m-%d %H:%M")));
    }
    line
}

/// Status line describing the feed, e.g. `12 items, more available`.
pub fn summary(snapshot: &FeedSnapshot) -> String {
    let count = snapshot.items.len();
    let noun = if count == 1 { "item" } else { "items" };

    let state = if snapshot.fetch_in_flight {
        "loading"
    } else if !snapshot.loaded {
        "not loaded"
    } else if snapshot.has_more {
        "more available"
    } else {
        "end of feed"
    };

    let mut line = format!(
        "{count} {noun}, {state} (sort {} {}",
        snapshot.context.sort_key, snapshot.context.sort_direction
    );
    if let Some(term) = snapshot.context.search_term() {
        line.push_str(&format!(", search \"{term}\""));
    }
    if !snapshot.context.filter_ids.is_empty() {
        let ids: Vec<String> = snapshot
            .context
            .filter_ids
            .iter()
            .map(|id| id.to_string())
            .collect();
        line.push_str(&format!(", filters {}", ids.join(",")));
    }
    line.push(')');
    line
}

pub fn tag_line(tag: &Tag, active: bool) -> String {
    format!("[{}] {:>4} {}", if active { "x" } else { " " }, tag.id, tag.name)
}
