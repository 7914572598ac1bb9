//! Feed state and the page merge algorithm.
//!
//! Pure data: no locking and no I/O. [`FeedController`](crate::FeedController)
//! wraps a [`FeedState`] in a mutex and calls [`FeedState::merge_page`]
//! when a fetch completes.

use std::collections::HashSet;

use gallery_core::context::ViewingContext;
use gallery_core::item::Item;
use gallery_core::pagination::Cursor;
use gallery_core::types::ItemId;

/// Result of merging one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeResult {
    /// Items actually appended after de-duplication.
    pub appended: usize,
    /// Items in the raw page, duplicates included.
    pub received: usize,
    /// The page was short and the feed is now exhausted.
    pub exhausted: bool,
}

/// Client-visible feed for one viewing-context generation.
#[derive(Debug, Clone)]
pub struct FeedState {
    pub(crate) context: ViewingContext,
    pub(crate) generation: u64,
    pub(crate) items: Vec<Item>,
    ids: HashSet<ItemId>,
    pub(crate) cursor: Option<Cursor>,
    pub(crate) has_more: bool,
    pub(crate) fetch_in_flight: bool,
    /// At least one fetch of this generation has completed.
    pub(crate) loaded: bool,
}

impl FeedState {
    pub fn new(context: ViewingContext, generation: u64) -> Self {
        Self {
            context,
            generation,
            items: Vec::new(),
            ids: HashSet::new(),
            cursor: None,
            has_more: true,
            fetch_in_flight: false,
            loaded: false,
        }
    }

    /// Start a fresh generation for `context`, dropping every item.
    ///
    /// The in-flight flag is cleared as well: a fetch issued under the old
    /// generation no longer counts and its result will be discarded.
    pub fn reset(&mut self, context: ViewingContext) {
        *self = Self::new(context, self.generation + 1);
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    /// Merge a raw page into the feed.
    ///
    /// Items already present are skipped; the rest are appended in page
    /// order. The cursor follows the last *raw* item so it keeps advancing
    /// even when every item was a duplicate. A page shorter than
    /// `page_size` ends the feed; an oversized page does not.
    pub fn merge_page(&mut self, page: Vec<Item>, page_size: usize) -> MergeResult {
        let received = page.len();

        if let Some(last) = page.last() {
            self.cursor = Some(Cursor::after(last, self.context.sort_key));
        }

        let mut appended = 0;
        for item in page {
            if self.ids.insert(item.id) {
                self.items.push(item);
                appended += 1;
            }
        }

        self.has_more = received >= page_size;
        self.loaded = true;

        MergeResult {
            appended,
            received,
            exhausted: !self.has_more,
        }
    }

    /// Record a failed fetch: stop automatic paging, leave items alone.
    pub fn fail(&mut self) {
        self.has_more = false;
        self.loaded = true;
    }
}
