//! Record model shared by every collection.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HubError, Result};

/// Field name the backend uses for record identity.
pub const DEFAULT_IDENTITY_FIELD: &str = "_id";

/// A persisted item the synchronizer can keep in a local list.
///
/// Implementors round-trip through JSON without losing fields, so that
/// local edits can be applied on the field map and read back.
pub trait SyncRecord:
    Serialize + DeserializeOwned + Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
    /// The server-assigned identity.
    fn record_id(&self) -> &str;

    /// Field map view of this record.
    fn to_fields(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(HubError::internal("record did not serialize to an object")),
        }
    }

    /// Rebuilds a record from a field map.
    fn from_fields(fields: Map<String, Value>) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// An untyped record: identity plus a free-form field map.
///
/// Used where a collection is handled generically (the CLI, the dashboard).
/// The identity lives inside `fields` under `_id` (or `id` as a fallback),
/// exactly as the backend sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Builds a record; fails when no identity is present.
    pub fn new(fields: Map<String, Value>) -> Result<Self> {
        let record = Self { fields };
        if record.identity().is_none() {
            return Err(HubError::Serialization {
                format: "JSON".to_string(),
                message: "record has no identity".to_string(),
            });
        }
        Ok(record)
    }

    fn identity(&self) -> Option<&str> {
        [DEFAULT_IDENTITY_FIELD, "id"]
            .iter()
            .find_map(|key| self.fields.get(*key).and_then(Value::as_str))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String value of a field, if it is a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

impl SyncRecord for Record {
    fn record_id(&self) -> &str {
        self.identity().unwrap_or_default()
    }

    fn to_fields(&self) -> Result<Map<String, Value>> {
        Ok(self.fields.clone())
    }

    fn from_fields(fields: Map<String, Value>) -> Result<Self> {
        Self::new(fields)
    }
}

/// Whether a field value counts as filled in.
///
/// Null, empty/whitespace strings and empty arrays are blank; numbers and
/// booleans are always present.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Bool(_)) | Some(Value::Number(_)) => false,
    }
}
