//! Realtime notifier message types and parser.
//!
//! The backend sends JSON objects tagged by an `"event"` field, e.g.
//! `{"event": "created", "path": "/photos/a.jpg", "image_id": 12}`. This
//! module deserializes them into a strongly-typed [`NotifierMessage`].

use gallery_core::types::ItemId;
use serde::Deserialize;

/// All known notifier message types.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotifierMessage {
    /// A new file was indexed.
    Created(FileEventData),

    /// An indexed file changed on disk or in the database.
    Modified(FileEventData),

    /// An indexed file was removed.
    Deleted(FileEventData),

    /// An indexed file was moved or renamed.
    Moved(MoveEventData),
}

/// Payload for `created`, `modified` and `deleted` messages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileEventData {
    #[serde(default)]
    pub path: Option<String>,
    /// Present once the backend has assigned the item an id.
    #[serde(default)]
    pub image_id: Option<ItemId>,
}

/// Payload for `moved` messages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoveEventData {
    pub from_path: String,
    pub to_path: String,
    #[serde(default)]
    pub image_id: Option<ItemId>,
}

impl NotifierMessage {
    /// Item id carried by the message, when the backend supplied one.
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            NotifierMessage::Created(d)
            | NotifierMessage::Modified(d)
            | NotifierMessage::Deleted(d) => d.image_id,
            NotifierMessage::Moved(d) => d.image_id,
        }
    }
}

/// Parse a raw text frame into a [`NotifierMessage`].
pub fn parse_message(text: &str) -> Result<NotifierMessage, serde_json::Error> {
    serde_json::from_str(text)
}
