//! Error types for the DDNS diagnostics system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for diagnostics operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS diagnostics system
#[derive(Error, Debug)]
pub enum Error {
    /// Event log read/write failures
    #[error("Event log error: {0}")]
    EventLog(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Raw I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Shared key mismatch on a write request
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid input (malformed address, bad query parameter)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Registrar or resolver failure, including timeouts
    #[error("External tool error ({tool}): {message}")]
    ExternalTool {
        /// Tool name
        tool: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an event log error
    pub fn event_log(msg: impl Into<String>) -> Self {
        Self::EventLog(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a permission denied error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an external tool error
    pub fn external_tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether this error was caused by the client rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::PermissionDenied(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
