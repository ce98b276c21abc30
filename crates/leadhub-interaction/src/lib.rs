//! Network access to the LeadHub content backend.

pub mod http_client;

pub use http_client::HttpApiClient;
