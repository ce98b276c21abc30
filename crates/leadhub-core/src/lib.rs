//! Domain types and contracts for the LeadHub admin client.
//!
//! Nothing in this crate performs I/O. The transport lives behind
//! [`api::ApiTransport`]; everything else is plain data and pure functions.

pub mod api;
pub mod collection;
pub mod composite;
pub mod config;
pub mod dates;
pub mod document;
pub mod envelope;
pub mod error;
pub mod feedback;
pub mod merge;
pub mod record;
pub mod route;
pub mod session;
pub mod validation;

// Re-export common error type
pub use error::{HubError, Result};
