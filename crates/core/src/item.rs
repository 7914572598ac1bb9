//! Gallery item and tag records as delivered by the backend.
//!
//! An [`Item`] is opaque apart from its `id`: every other field is kept
//! verbatim in [`Item::payload`] so that a host can render whatever the
//! backend sends without this crate tracking schema changes.

use serde::{Deserialize, Serialize};

use crate::context::SortKey;
use crate::types::{ItemId, TagId, Timestamp};

/// One gallery entry (image or video).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// All remaining fields, passed through unmodified.
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl Item {
    /// Build an item with no payload. Mostly useful in tests and for
    /// placeholders.
    pub fn bare(id: ItemId) -> Self {
        Self {
            id,
            payload: serde_json::Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }

    pub fn filename(&self) -> Option<&str> {
        self.str_field("filename")
    }

    pub fn path(&self) -> Option<&str> {
        self.str_field("path")
    }

    pub fn checksum(&self) -> Option<&str> {
        self.str_field("checksum")
    }

    pub fn is_video(&self) -> bool {
        self.payload
            .get("is_video")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn date_created(&self) -> Option<Timestamp> {
        self.timestamp_field("date_created")
    }

    pub fn date_modified(&self) -> Option<Timestamp> {
        self.timestamp_field("date_modified")
    }

    fn timestamp_field(&self, key: &str) -> Option<Timestamp> {
        let raw = self.str_field(key)?;
        chrono::DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .ok()
            .or_else(|| {
                // The backend serializes naive UTC datetimes without an offset.
                chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    /// Ids of the tags embedded in the item payload, in payload order.
    pub fn tag_ids(&self) -> Vec<TagId> {
        self.payload
            .get("tags")
            .and_then(|v| v.as_array())
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.get("id").and_then(|id| id.as_i64()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// String form of the value this item is sorted by under `key`.
    ///
    /// Used as `last_sort_value` for keyset pagination. Returns `None` when
    /// the payload lacks the field or holds a non-scalar value.
    pub fn sort_value(&self, key: SortKey) -> Option<String> {
        if key == SortKey::Id {
            return Some(self.id.to_string());
        }
        match self.payload.get(key.as_str())? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// A tag definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub admin_only: bool,
    #[serde(default)]
    pub built_in: bool,
}

impl Tag {
    /// Search expression that selects every item carrying this tag.
    pub fn search_expression(&self) -> String {
        format!("TAG:\"{}\"", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Item {
        serde_json::from_value(serde_json::json!({
            "id": 42,
            "filename": "beach.jpg",
            "path": "/photos/2024",
            "checksum": "abc123",
            "is_video": false,
            "date_created": "2024-06-01T12:30:00",
            "date_modified": "2024-06-02T08:00:00Z",
            "tags": [{"id": 3, "name": "summer"}, {"id": 9, "name": "family"}],
            "meta": {"width": 4000, "height": 3000}
        }))
        .unwrap()
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let item = sample();
        assert_eq!(item.id, 42);
        assert_eq!(item.payload["meta"]["width"], 4000);

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["meta"]["height"], 3000);
        assert_eq!(back["id"], 42);
    }

    #[test]
    fn well_known_accessors() {
        let item = sample();
        assert_eq!(item.filename(), Some("beach.jpg"));
        assert_eq!(item.checksum(), Some("abc123"));
        assert!(!item.is_video());
        assert_eq!(item.tag_ids(), vec![3, 9]);
    }

    #[test]
    fn naive_and_offset_timestamps_both_parse() {
        let item = sample();
        assert!(item.date_created().is_some());
        assert!(item.date_modified().is_some());
    }

    #[test]
    fn sort_value_reads_payload_field() {
        let item = sample();
        assert_eq!(
            item.sort_value(SortKey::DateCreated).as_deref(),
            Some("2024-06-01T12:30:00")
        );
        assert_eq!(item.sort_value(SortKey::Id).as_deref(), Some("42"));
    }

    #[test]
    fn sort_value_missing_field_is_none() {
        assert!(Item::bare(1).sort_value(SortKey::Filename).is_none());
    }

    #[test]
    fn item_without_id_fails_to_parse() {
        let result: Result<Item, _> = serde_json::from_value(serde_json::json!({"filename": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn tag_search_expression_quotes_name() {
        let tag: Tag = serde_json::from_value(serde_json::json!({"id": 1, "name": "red car"})).unwrap();
        assert_eq!(tag.search_expression(), "TAG:\"red car\"");
    }
}
