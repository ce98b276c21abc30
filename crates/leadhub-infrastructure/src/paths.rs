//! Platform paths for LeadHub files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/leadhub/           # Config directory (dirs::config_dir)
//! ├── config.toml              # Client configuration
//! ├── session.cookie           # Persisted session cookie (mode 600)
//! └── logs/                    # Application logs
//!     └── leadhub.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

use leadhub_core::HubError;

const APP_DIR: &str = "leadhub";

/// Resolves every file the client reads or writes.
///
/// The root is the platform config directory by default; tests point it at
/// a temporary directory with [`HubPaths::with_root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubPaths {
    root: PathBuf,
}

impl HubPaths {
    /// Paths under the platform config directory.
    pub fn new_default() -> Result<Self, HubError> {
        let base = dirs::config_dir()
            .ok_or_else(|| HubError::config("Cannot find the platform config directory"))?;
        Ok(Self {
            root: base.join(APP_DIR),
        })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config_dir(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn cookie_file(&self) -> PathBuf {
        self.root.join("session.cookie")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}
