// crates/core/src/error.rs
//! Shared error types for the billstage workspace

use std::io;
use thiserror::Error;

/// Result type for operations returning [`AppError`]
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors shared across the persistence and capture layers
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {message}")]
    DatabaseError {
        /// What was being attempted
        message: String,
        /// Underlying driver error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A row expected to exist was not found
    #[error("{entity} not found: {identifier}")]
    RecordNotFound {
        /// Entity kind, e.g. "Customer"
        entity: String,
        /// The identifier that was looked up
        identifier: String,
    },

    /// A local record could not be made JSON-safe
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller passed an invalid value
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument {
        /// Offending argument
        argument: String,
        /// Why it was rejected
        reason: String,
    },

    /// Generic I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AppError {
    /// Wraps a database driver error with context
    pub fn database(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::DatabaseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if the error indicates a missing row rather than a fault
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::RecordNotFound { .. })
    }
}
