//! File storage for configuration and the session cookie.

mod atomic_toml;
mod cookie_storage;

pub use atomic_toml::AtomicTomlFile;
pub use cookie_storage::CookieFile;
