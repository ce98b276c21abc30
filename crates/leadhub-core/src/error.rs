//! Error types for the LeadHub client.

use thiserror::Error;

/// Generic message shown when a request never produced a usable answer.
pub const GENERIC_TRANSPORT_MESSAGE: &str = "Network error, please try again";

/// A shared error type for the entire LeadHub client.
///
/// The first four variants are the operation-level taxonomy every admin
/// panel reports through: local validation, transport failures, server
/// rejections and authentication failures. The rest cover local plumbing
/// (files, configuration, serialization).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HubError {
    /// Required fields are missing; raised before any request is sent.
    #[error("Missing required fields: {}", .fields.join(", "))]
    Validation { fields: Vec<String> },

    /// The request never reached the server or came back unusable.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a structured failure.
    #[error("{message}")]
    Server {
        status: Option<u16>,
        message: String,
    },

    /// Session missing or expired (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A mutation is already in flight for this record.
    #[error("Operation already pending for '{id}'")]
    Busy { id: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The collection does not expose this operation.
    #[error("{collection} does not support {operation}")]
    Unsupported {
        collection: String,
        operation: &'static str,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HubError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error from the missing field names.
    pub fn validation<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Validation {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Server error without a status code (e.g. `success: false` on 2xx)
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a Server error carrying the HTTP status
    pub fn server_status(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an Unsupported error
    pub fn unsupported(collection: impl Into<String>, operation: &'static str) -> Self {
        Self::Unsupported {
            collection: collection.into(),
            operation,
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an authentication failure
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Check if this is a local validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this is a transport failure
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this is a server rejection
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Missing field names for a validation error, empty otherwise.
    pub fn missing_fields(&self) -> &[String] {
        match self {
            Self::Validation { fields } => fields,
            _ => &[],
        }
    }

    /// The text shown to an admin when this error ends an operation.
    ///
    /// Server messages are passed through verbatim; transport failures are
    /// reported generically.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { fields } => {
                format!("Please fill in: {}", fields.join(", "))
            }
            Self::Transport(_) => GENERIC_TRANSPORT_MESSAGE.to_string(),
            Self::Server { message, .. } => message.clone(),
            Self::Unauthorized(_) => "Session expired, please log in again".to_string(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for HubError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for HubError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for HubError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used at binary boundaries)
impl From<anyhow::Error> for HubError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, HubError>`.
pub type Result<T> = std::result::Result<T, HubError>;
