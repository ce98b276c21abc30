//! Configuration service.
//!
//! Loads `config.toml`, caches it, and layers environment variables and
//! command-line overrides on top.

use std::sync::{Arc, PoisonError, RwLock};

use leadhub_core::Result;
use leadhub_core::config::ClientConfig;

use crate::paths::HubPaths;
use crate::storage::AtomicTomlFile;

/// Loads and caches the client configuration.
#[derive(Clone)]
pub struct ConfigService {
    file: Arc<AtomicTomlFile<ClientConfig>>,
    /// Cached file contents, filled on first access.
    cache: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    pub fn new(paths: &HubPaths) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(paths.config_file())),
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// The configuration stored on disk, or defaults when there is no file.
    pub fn stored(&self) -> Result<ClientConfig> {
        {
            let cached = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = match self.file.load()? {
            Some(config) => {
                tracing::debug!("[ConfigService] Loaded {}", self.file.path().display());
                config
            }
            None => {
                tracing::debug!("[ConfigService] No config file, using defaults");
                ClientConfig::default()
            }
        };

        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Stored configuration with overrides applied.
    ///
    /// Priority (highest first):
    /// 1. `api_url_override` (the `--api-url` flag)
    /// 2. Environment variables (`LEADHUB_API_URL`, `LEADHUB_TIMEOUT_SECS`)
    /// 3. config.toml
    /// 4. Built-in defaults
    pub fn effective<F>(&self, lookup: F, api_url_override: Option<&str>) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.stored()?.with_env(lookup)?;
        if let Some(url) = api_url_override {
            config.api_url = url.to_string();
        }
        config.validate()?;
        Ok(config)
    }

    /// Persists a new API URL.
    pub fn set_api_url(&self, url: &str) -> Result<ClientConfig> {
        let candidate = ClientConfig {
            api_url: url.to_string(),
            timeout_secs: None,
        };
        candidate.validate()?;
        self.write(|config| config.api_url = url.to_string())
    }

    /// Persists a request timeout; `None` restores the transport default.
    pub fn set_timeout(&self, timeout_secs: Option<u64>) -> Result<ClientConfig> {
        self.write(|config| config.timeout_secs = timeout_secs)
    }

    fn write(&self, f: impl FnOnce(&mut ClientConfig)) -> Result<ClientConfig> {
        let updated = self.file.update(ClientConfig::default(), |config| {
            f(config);
            config.validate()
        })?;
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(updated.clone());
        tracing::info!("[ConfigService] Configuration updated");
        Ok(updated)
    }

    /// Forces a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadhub_core::config::{DEFAULT_API_URL, ENV_API_URL};
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> ConfigService {
        ConfigService::new(&HubPaths::with_root(dir.path()))
    }

    #[test]
    fn test_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = service(&temp_dir).stored().unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_override_priority() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        service.set_api_url("http://from-file:1").unwrap();

        let env = |key: &str| (key == ENV_API_URL).then(|| "http://from-env:2".to_string());
        assert_eq!(
            service.effective(|_| None, None).unwrap().api_url,
            "http://from-file:1"
        );
        assert_eq!(service.effective(env, None).unwrap().api_url, "http://from-env:2");
        assert_eq!(
            service.effective(env, Some("http://from-flag:3")).unwrap().api_url,
            "http://from-flag:3"
        );
    }

    #[test]
    fn test_rejects_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        assert!(service.set_api_url("localhost").is_err());
        assert!(service.effective(|_| None, Some("nope")).is_err());
    }

    #[test]
    fn test_cache_invalidation_rereads_file() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(&temp_dir);
        assert_eq!(service.stored().unwrap().timeout_secs, None);

        std::fs::write(
            temp_dir.path().join("config.toml"),
            "api_url = \"http://x\"\ntimeout_secs = 9\n",
        )
        .unwrap();
        assert_eq!(service.stored().unwrap().timeout_secs, None);

        service.invalidate_cache();
        assert_eq!(service.stored().unwrap().timeout_secs, Some(9));
    }
}
