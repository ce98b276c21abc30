//! Client configuration.

use serde::{Deserialize, Serialize};

use crate::error::{HubError, Result};

/// The deployed backend.
pub const DEFAULT_API_URL: &str = "https://backendleadershiphub-2.onrender.com";

pub const ENV_API_URL: &str = "LEADHUB_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "LEADHUB_TIMEOUT_SECS";

/// Settings the API client is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout; the transport default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Applies environment overrides read through `lookup`.
    ///
    /// Taking a lookup function keeps this testable without touching the
    /// process environment.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                HubError::config(format!("{} must be a whole number, got '{}'", ENV_TIMEOUT_SECS, raw))
            })?;
            self.timeout_secs = Some(secs);
        }
        Ok(self)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(HubError::config(format!(
                "api_url must start with http:// or https://, got '{}'",
                self.api_url
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(HubError::config("timeout_secs must be greater than zero"));
        }
        Ok(())
    }
}
