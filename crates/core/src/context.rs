//! Viewing context: the sort, filter and search parameters that define
//! one feed.
//!
//! Changing any field of a [`ViewingContext`] invalidates every page
//! fetched under the previous value, so hosts compare contexts with `==`
//! to decide whether a feed reset is required.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::FilterId;

// ---------------------------------------------------------------------------
// Sort key
// ---------------------------------------------------------------------------

/// Item column the backend orders the feed by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    DateCreated,
    DateModified,
    Filename,
    Checksum,
    Id,
}

impl SortKey {
    /// Wire name used for the `sort_by` query parameter and as the item
    /// payload field holding the sort value.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::DateCreated => "date_created",
            SortKey::DateModified => "date_modified",
            SortKey::Filename => "filename",
            SortKey::Checksum => "checksum",
            SortKey::Id => "id",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_created" => Ok(SortKey::DateCreated),
            "date_modified" => Ok(SortKey::DateModified),
            "filename" => Ok(SortKey::Filename),
            "checksum" => Ok(SortKey::Checksum),
            "id" => Ok(SortKey::Id),
            other => Err(CoreError::Validation(format!(
                "Invalid sort key '{other}'. Must be one of: date_created, date_modified, filename, checksum, id"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Sort direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(CoreError::Validation(format!(
                "Invalid sort direction '{other}'. Must be 'asc' or 'desc'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Viewing context
// ---------------------------------------------------------------------------

/// Everything that determines which items a feed shows and in what order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewingContext {
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    /// Active saved filters. A `BTreeSet` keeps equality independent of
    /// the order in which filters were toggled.
    #[serde(default)]
    pub filter_ids: BTreeSet<FilterId>,
    #[serde(default)]
    search_term: Option<String>,
}

impl ViewingContext {
    pub fn new(sort_key: SortKey, sort_direction: SortDirection) -> Self {
        Self {
            sort_key,
            sort_direction,
            ..Default::default()
        }
    }

    /// Set the free-text search term. Surrounding whitespace is trimmed and
    /// an empty term clears the search.
    pub fn with_search(mut self, term: impl AsRef<str>) -> Self {
        self.set_search(term);
        self
    }

    pub fn with_filters(mut self, filter_ids: impl IntoIterator<Item = FilterId>) -> Self {
        self.filter_ids = filter_ids.into_iter().collect();
        self
    }

    pub fn set_search(&mut self, term: impl AsRef<str>) {
        let trimmed = term.as_ref().trim();
        self.search_term = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn clear_search(&mut self) {
        self.search_term = None;
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search_term.as_deref()
    }

    /// Toggle a saved filter on or off. Returns `true` when the filter is
    /// active afterwards.
    pub fn toggle_filter(&mut self, filter_id: FilterId) -> bool {
        if self.filter_ids.remove(&filter_id) {
            false
        } else {
            self.filter_ids.insert(filter_id);
            true
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
