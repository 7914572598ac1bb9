//! Events emitted by the realtime notifier task.
//!
//! These are what subscribers see: connection state changes plus one
//! event per parsed backend message.

use gallery_core::types::ItemId;
use serde::Serialize;

use crate::messages::NotifierMessage;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierEvent {
    /// The websocket connection was established.
    Connected,

    /// The websocket connection was lost.
    Disconnected,

    ItemCreated {
        item_id: Option<ItemId>,
        path: Option<String>,
    },

    ItemModified {
        item_id: Option<ItemId>,
        path: Option<String>,
    },

    ItemDeleted {
        item_id: Option<ItemId>,
        path: Option<String>,
    },

    ItemMoved {
        item_id: Option<ItemId>,
        from_path: String,
        to_path: String,
    },
}

impl NotifierEvent {
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            NotifierEvent::Connected | NotifierEvent::Disconnected => None,
            NotifierEvent::ItemCreated { item_id, .. }
            | NotifierEvent::ItemModified { item_id, .. }
            | NotifierEvent::ItemDeleted { item_id, .. }
            | NotifierEvent::ItemMoved { item_id, .. } => *item_id,
        }
    }
}

impl From<NotifierMessage> for NotifierEvent {
    fn from(msg: NotifierMessage) -> Self {
        match msg {
            NotifierMessage::Created(d) => NotifierEvent::ItemCreated {
                item_id: d.image_id,
                path: d.path,
            },
            NotifierMessage::Modified(d) => NotifierEvent::ItemModified {
                item_id: d.image_id,
                path: d.path,
            },
            NotifierMessage::Deleted(d) => NotifierEvent::ItemDeleted {
                item_id: d.image_id,
                path: d.path,
            },
            NotifierMessage::Moved(d) => NotifierEvent::ItemMoved {
                item_id: d.image_id,
                from_path: d.from_path,
                to_path: d.to_path,
            },
        }
    }
}
