//! Transport contract between the client and the content backend.
//!
//! Every panel and the session store talk to the backend through
//! [`ApiTransport`]. The production implementation lives in
//! `leadhub-interaction`; tests supply in-memory fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{HubError, Result};
use crate::record::Attachment;

/// HTTP verbs used by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// One named part of a multipart submission.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, attachment: Attachment },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

/// A multipart form body, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text part.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Appends a file part.
    pub fn file(mut self, name: impl Into<String>, attachment: Attachment) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            attachment,
        });
        self
    }

    /// Returns the text value of the first part with this name.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Returns the names of all file parts.
    pub fn file_names(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                FormPart::File { name, .. } => Some(name.as_str()),
                FormPart::Text { .. } => None,
            })
            .collect()
    }
}

/// Request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

/// A request relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method,
            path: path.into(),
            body,
        }
    }
}

/// A successful (2xx) response with its decoded JSON body.
///
/// Empty bodies decode to `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

/// The single configured transport every consumer shares.
///
/// Implementations attach credentials (cookies) to every request, never
/// retry and never cache. `send` resolves to `Ok` only for 2xx statuses;
/// anything else is turned into a [`HubError`] via [`error_from_status`],
/// and requests that never got an answer become [`HubError::Transport`].
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Sends one request.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;

    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::Get, path, RequestBody::Empty))
            .await
    }

    async fn post(&self, path: &str, body: RequestBody) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::Post, path, body)).await
    }

    async fn put(&self, path: &str, body: RequestBody) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::Put, path, body)).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::new(Method::Delete, path, RequestBody::Empty))
            .await
    }
}

/// Pulls the server-supplied failure message out of a response body.
///
/// Looks at `message`, then `error`, and accepts a bare JSON string.
pub fn server_message(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => ["message", "error"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|v| v.as_str().filter(|s| !s.trim().is_empty()))
            .map(str::to_string),
        _ => None,
    }
}

/// Maps a non-2xx response to the error taxonomy.
pub fn error_from_status(status: u16, body: &Value) -> HubError {
    let message = server_message(body);
    if status == 401 {
        return HubError::unauthorized(message.unwrap_or_else(|| "Not authenticated".to_string()));
    }
    HubError::server_status(
        status,
        message.unwrap_or_else(|| format!("Request failed with status {}", status)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_display_is_uppercase() {
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_status_401_is_auth_error() {
        let err = error_from_status(401, &json!({ "message": "jwt expired" }));
        assert_eq!(err, HubError::unauthorized("jwt expired"));
    }

    #[test]
    fn test_server_message_is_kept() {
        let err = error_from_status(409, &json!({ "success": false, "message": "locked" }));
        assert_eq!(err, HubError::server_status(409, "locked"));
    }

    #[test]
    fn test_missing_message_falls_back_to_status() {
        let err = error_from_status(500, &Value::Null);
        assert_eq!(err.to_string(), "Request failed with status 500");
    }

    #[test]
    fn test_multipart_builder_keeps_order() {
        let form = MultipartForm::new()
            .text("data", "{}")
            .file("image", Attachment::new("me.png", vec![1, 2, 3]));
        assert_eq!(form.parts[0].name(), "data");
        assert_eq!(form.text_value("data"), Some("{}"));
        assert_eq!(form.file_names(), vec!["image"]);
    }
}
