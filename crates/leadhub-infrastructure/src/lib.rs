//! Filesystem concerns: paths, configuration and the persisted session.

pub mod config_service;
pub mod paths;
pub mod storage;

pub use config_service::ConfigService;
pub use paths::HubPaths;
pub use storage::{AtomicTomlFile, CookieFile};
