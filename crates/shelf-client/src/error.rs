//! # Client Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Response            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  GraphQl                │ │
//! │  │  InvalidUrl     │  │  Status         │  │  MissingData            │ │
//! │  │  ConfigLoad/Save│  │  Timeout        │  │  Deserialization        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Domain       │  │   Offline store │  │      Runtime            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core           │  │  Database       │  │  ChannelError           │ │
//! │  │  NotAuthenticated│ │  QueueFull      │  │  ShuttingDown           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shelf_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Endpoint URL failed to parse or uses an unsupported scheme.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never produced a response (DNS, refused, reset).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("Server returned HTTP {status}")]
    Status { status: u16 },

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // Response Errors
    // =========================================================================
    /// The response carried a non-empty `errors` array.
    ///
    /// ## When This Occurs
    /// ```text
    /// { "data": null, "errors": [{ "message": "Book not found" }] }
    ///                                          │
    ///                                          ▼
    ///                         GraphQl("Book not found")
    /// ```
    #[error("{0}")]
    GraphQl(String),

    /// The response had neither errors nor the expected field.
    #[error("Response is missing field `{0}`")]
    MissingData(String),

    #[error("Failed to decode response: {0}")]
    Deserialization(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Please log in to {action}")]
    NotAuthenticated { action: String },

    // =========================================================================
    // Offline Store Errors
    // =========================================================================
    #[error("Offline store error: {0}")]
    Database(String),

    /// The write queue refused a write because it is at capacity.
    #[error("Offline write queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    // =========================================================================
    // Runtime Errors
    // =========================================================================
    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Client is shutting down")]
    ShuttingDown,
}

impl ClientError {
    pub fn not_authenticated(action: impl Into<String>) -> Self {
        ClientError::NotAuthenticated {
            action: action.into(),
        }
    }

    /// Returns true if the operation can be retried as-is.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - 5xx and 429 responses
    /// - Offline store failures (locked database, full disk)
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(_) | ClientError::Timeout(_) | ClientError::Database(_) => true,
            ClientError::Status { status } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Core(CoreError::Validation(err))
    }
}

impl From<shelf_db::DbError> for ClientError {
    fn from(err: shelf_db::DbError) -> Self {
        ClientError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ClientError::Status {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            ClientError::Deserialization(err.to_string())
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Deserialization(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}
