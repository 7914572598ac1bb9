/// Server-assigned item identifiers; strictly ordered per feed.
pub type ItemId = i64;

/// Tag identifiers as assigned by the backend.
pub type TagId = i64;

/// Saved-filter identifiers as assigned by the backend.
pub type FilterId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
