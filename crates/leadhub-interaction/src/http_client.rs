//! reqwest-backed [`ApiTransport`].
//!
//! One client per process, one base URL, one cookie jar. Every request
//! carries the jar's cookies, so the session cookie set by `POST /login`
//! authenticates everything that follows.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use leadhub_core::api::{
    ApiRequest, ApiResponse, ApiTransport, FormPart, Method, MultipartForm, RequestBody,
    error_from_status,
};
use leadhub_core::config::ClientConfig;
use leadhub_core::{HubError, Result};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde_json::Value;

/// HTTP client for the content backend.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    jar: Arc<Jar>,
}

impl HttpApiClient {
    /// Builds a client from configuration with an empty cookie jar.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let jar = Arc::new(Jar::default());
        let mut builder = Client::builder().cookie_provider(jar.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| HubError::config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::debug!(
            "[HttpApiClient] Initialized for {} (timeout: {:?})",
            config.base_url(),
            config.timeout_secs
        );

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            jar,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a backend path.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn origin(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| HubError::config(format!("Invalid api_url '{}': {}", self.base_url, e)))
    }

    /// Cookies the jar would send to the backend, as a `Cookie` header value.
    ///
    /// Returns `None` when there is no session.
    pub fn export_cookies(&self) -> Result<Option<String>> {
        let origin = self.origin()?;
        Ok(self
            .jar
            .cookies(&origin)
            .and_then(|header| header.to_str().ok().map(str::to_string))
            .filter(|cookies| !cookies.is_empty()))
    }

    /// Restores cookies previously returned by [`export_cookies`](Self::export_cookies).
    pub fn import_cookies(&self, cookies: &str) -> Result<()> {
        let origin = self.origin()?;
        let mut restored = 0;
        for pair in cookies.split(';').map(str::trim).filter(|p| p.contains('=')) {
            self.jar.add_cookie_str(pair, &origin);
            restored += 1;
        }
        tracing::debug!("[HttpApiClient] Restored {} cookie(s)", restored);
        Ok(())
    }
}

#[async_trait]
impl ApiTransport for HttpApiClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.path);
        tracing::debug!("[HttpApiClient] {} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(to_form(form)?),
        };

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_reqwest_error)?;
        let body = decode_body(&text);

        if (200..300).contains(&status) {
            Ok(ApiResponse { status, body })
        } else {
            let error = error_from_status(status, &body);
            tracing::warn!(
                "[HttpApiClient] {} {} failed with {}: {}",
                request.method,
                request.path,
                status,
                error
            );
            Err(error)
        }
    }
}

/// Converts the transport-neutral form into a reqwest form.
fn to_form(form: MultipartForm) -> Result<Form> {
    let mut out = Form::new();
    for part in form.parts {
        out = match part {
            FormPart::Text { name, value } => out.text(name, value),
            FormPart::File { name, attachment } => {
                let mime = mime_guess::from_path(&attachment.file_name).first_or_octet_stream();
                let file = Part::bytes(attachment.bytes)
                    .file_name(attachment.file_name)
                    .mime_str(mime.essence_str())
                    .map_err(|e| HubError::internal(format!("Invalid MIME type: {}", e)))?;
                out.part(name, file)
            }
        };
    }
    Ok(out)
}

/// Decodes a response body: JSON when possible, otherwise plain text.
///
/// Empty bodies and HTML error pages decode to `Null` so they never end up
/// in a user-facing message.
fn decode_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

pub fn map_reqwest_error(err: reqwest::Error) -> HubError {
    if err.is_timeout() {
        HubError::transport(format!("Request timed out: {}", err))
    } else {
        HubError::transport(err.to_string())
    }
}
