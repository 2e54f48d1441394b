//! Error types and error handling for xpanel.
//!
//! This module defines the crate-wide error type, the error codes carried by
//! panel API responses, and the exit codes returned by the binary.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Error codes reported in panel API error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// E001: Process configuration is invalid
    #[serde(rename = "E001")]
    ConfigInvalid,

    /// E002: Settings store operation failed
    #[serde(rename = "E002")]
    StoreError,

    /// E003: Managed service failed to start or stop
    #[serde(rename = "E003")]
    ServiceError,

    /// E004: Legacy data migration failed
    #[serde(rename = "E004")]
    MigrationError,

    /// E005: Supervisor is not accepting requests
    #[serde(rename = "E005")]
    SupervisorUnavailable,
}

impl ErrorCode {
    /// Returns the error code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalid => "E001",
            ErrorCode::StoreError => "E002",
            ErrorCode::ServiceError => "E003",
            ErrorCode::MigrationError => "E004",
            ErrorCode::SupervisorUnavailable => "E005",
        }
    }

    /// Returns the HTTP status code reported for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::SupervisorUnavailable => 503,
            _ => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Process exit codes.
pub mod exit_code {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// General error
    pub const GENERAL_ERROR: i32 = 1;
    /// Configuration error
    pub const CONFIG_ERROR: i32 = 2;
    /// Command line argument error
    pub const CLI_ERROR: i32 = 64;
}

/// The main error type for xpanel.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Process configuration is invalid or cannot be loaded.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Settings store could not be opened or an operation on it failed.
    #[error("Store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The managed panel service failed to start or stop.
    #[error("Service error: {operation}: {message}")]
    Service {
        operation: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Importing legacy data failed.
    #[error("Migration error: {message}")]
    Migration {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The supervisor control channel is closed.
    #[error("Supervisor unavailable: {reason}")]
    Supervisor { reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl PanelError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PanelError::Config { .. } | PanelError::Yaml(_) => ErrorCode::ConfigInvalid,
            PanelError::Store { .. } | PanelError::Sqlite(_) => ErrorCode::StoreError,
            PanelError::Service { .. } | PanelError::Io(_) => ErrorCode::ServiceError,
            PanelError::Migration { .. } => ErrorCode::MigrationError,
            PanelError::Supervisor { .. } => ErrorCode::SupervisorUnavailable,
        }
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PanelError::Config { .. } | PanelError::Yaml(_) => exit_code::CONFIG_ERROR,
            _ => exit_code::GENERAL_ERROR,
        }
    }

    /// Creates a configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        PanelError::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error with a message and source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PanelError::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a store error with a message.
    pub fn store(message: impl Into<String>) -> Self {
        PanelError::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a store error with a message and source.
    pub fn store_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PanelError::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a service error for the named operation.
    pub fn service(operation: impl Into<String>, message: impl Into<String>) -> Self {
        PanelError::Service {
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a service error for the named operation with a source.
    pub fn service_with_source(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PanelError::Service {
            operation: operation.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a migration error with a message.
    pub fn migration(message: impl Into<String>) -> Self {
        PanelError::Migration {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a migration error with a message and source.
    pub fn migration_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PanelError::Migration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a supervisor-unavailable error.
    pub fn supervisor(reason: impl Into<String>) -> Self {
        PanelError::Supervisor {
            reason: reason.into(),
        }
    }
}

/// Error body of a failed panel API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "E005").
    pub code: ErrorCode,

    /// Human-readable error message.
    pub message: String,

    /// Structured context, when the error carries any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Creates an error body without details.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an error body from a PanelError.
    pub fn from_error(error: &PanelError) -> Self {
        let details = match error {
            PanelError::Service { operation, .. } => Some(json!({ "operation": operation })),
            PanelError::Supervisor { reason } => Some(json!({
                "reason": reason,
                "suggestion": "Send SIGHUP to the panel process instead",
            })),
            _ => None,
        };

        Self {
            details,
            ..Self::new(error.code(), error.to_string())
        }
    }
}

/// Result type alias for xpanel operations.
pub type Result<T> = std::result::Result<T, PanelError>;
