//! Typed records for the list collections.
//!
//! Unknown fields are kept in `extra` so a record survives a local edit and
//! re-serialization without dropping anything the server sent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::SyncRecord;

/// A news item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub newsurl: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SyncRecord for NewsItem {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// An event.
///
/// `day` and `month` are derived from `date` (see [`crate::dates::date_parts`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    /// "Past Event" or "Upcoming Event".
    #[serde(default)]
    pub status: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SyncRecord for Event {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// A book in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(rename = "publishDesc", default)]
    pub publish_desc: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SyncRecord for Book {
    fn record_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_news_keeps_unknown_fields() {
        let raw = json!({
            "_id": "n1",
            "title": "A",
            "date": "2024-01-01",
            "description": "B",
            "newsurl": "http://x",
            "__v": 0
        });
        let item: NewsItem = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(item.id, "n1");
        assert_eq!(serde_json::to_value(&item).unwrap(), raw);
    }

    #[test]
    fn test_event_status_names() {
        let event: Event = serde_json::from_value(json!({
            "_id": "e1",
            "status": "Upcoming Event"
        }))
        .unwrap();
        assert_eq!(event.status, "Upcoming Event");
        assert_eq!(event.day, None);
    }

    #[test]
    fn test_book_defaults() {
        let book: Book = serde_json::from_value(json!({ "_id": "b1", "title": "T" })).unwrap();
        assert!(book.tags.is_empty());
        assert_eq!(book.price, 0.0);
    }
}
