//! Cursor pagination types and page-size defaults.

use serde::{Deserialize, Serialize};

use crate::context::{SortKey, ViewingContext};
use crate::item::Item;
use crate::types::ItemId;

// ---------------------------------------------------------------------------
// Page size defaults
// ---------------------------------------------------------------------------

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 60;

/// Upper bound on a single page request.
pub const MAX_PAGE_SIZE: usize = 500;

/// Clamp a user-provided page size to valid bounds.
pub fn clamp_page_size(size: Option<usize>) -> usize {
    size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Position marker for the next page: the last item received.
///
/// `last_id` is the cursor's identity. `last_sort_value` accompanies it so
/// the backend can resume a keyset scan on a non-id sort column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub last_id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sort_value: Option<String>,
}

impl Cursor {
    pub fn new(last_id: ItemId) -> Self {
        Self {
            last_id,
            last_sort_value: None,
        }
    }

    /// Cursor positioned just after `item` for a feed sorted by `sort_key`.
    pub fn after(item: &Item, sort_key: SortKey) -> Self {
        Self {
            last_id: item.id,
            last_sort_value: item.sort_value(sort_key),
        }
    }
}

// ---------------------------------------------------------------------------
// Page request
// ---------------------------------------------------------------------------

/// Parameters for one page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page_size: usize,
    /// `None` for the first page.
    pub cursor: Option<Cursor>,
    pub context: ViewingContext,
}

impl PageRequest {
    pub fn first(context: ViewingContext, page_size: usize) -> Self {
        Self {
            page_size,
            cursor: None,
            context,
        }
    }
}
