//! Helpers for the backend's response envelopes.
//!
//! Lists arrive as `{ "data": [...] }` (the bookstore sends a bare array),
//! single records as `{ "data": {...} }`, deletions as `{ "success": bool }`.
//! Any envelope carrying `success: false` is a rejection even on HTTP 2xx.

use serde_json::Value;

use crate::api::server_message;
use crate::error::{HubError, Result};

/// Fails with the server's message when the body says `success: false`.
pub fn ensure_success(body: &Value) -> Result<()> {
    if let Some(false) = body.get("success").and_then(Value::as_bool) {
        return Err(HubError::server(
            server_message(body).unwrap_or_else(|| "Request was rejected".to_string()),
        ));
    }
    Ok(())
}

/// Extracts the record list from a list response.
///
/// A missing or null `data` is treated as an empty list.
pub fn extract_list(body: Value) -> Result<Vec<Value>> {
    ensure_success(&body)?;
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(unexpected("list", &other)),
        },
        Value::Null => Ok(Vec::new()),
        other => Err(unexpected("list", &other)),
    }
}

/// Extracts the single record from a create/update response, if present.
pub fn extract_record(body: &Value) -> Result<Option<Value>> {
    ensure_success(body)?;
    Ok(match body.get("data") {
        Some(record) if record.is_object() => Some(record.clone()),
        _ => None,
    })
}

/// Extracts a singleton document.
///
/// Accepts `{ data: {...} }`, `{ data: [{...}, ...] }` (first element wins),
/// or a bare object.
pub fn extract_document(body: Value) -> Result<Option<Value>> {
    ensure_success(&body)?;
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(doc @ Value::Object(_)) => Ok(Some(doc)),
            Some(Value::Array(items)) => Ok(items.into_iter().find(Value::is_object)),
            Some(Value::Null) => Ok(None),
            Some(other) => Err(unexpected("document", &other)),
            None if map.is_empty() => Ok(None),
            None => Ok(Some(Value::Object(map))),
        },
        Value::Null => Ok(None),
        other => Err(unexpected("document", &other)),
    }
}

fn unexpected(what: &str, value: &Value) -> HubError {
    HubError::Serialization {
        format: "JSON".to_string(),
        message: format!("expected {} envelope, got {}", what, kind_of(value)),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
