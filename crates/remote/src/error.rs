// crates/remote/src/error.rs
//! Error types for remote store operations

use serde_json::{json, Value};
use thiserror::Error;

/// Result type for remote store operations
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur talking to the remote store
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote store answered with a non-success status
    #[error("Remote rejected request with status {status}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, parsed as JSON when possible
        body: Value,
    },

    /// An update or delete payload carried no `id` field
    #[error("Record for table '{table}' has no id")]
    MissingId {
        /// Destination table
        table: String,
    },

    /// The configured base URL could not be used
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// No reachable network
    #[error("Remote store is unreachable")]
    Unavailable,
}

impl RemoteError {
    /// Returns true for failures worth retrying on a later attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Http(_) | RemoteError::Unavailable => true,
            RemoteError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Flattens the error into the JSON diagnostics shape persisted with
    /// failed records
    pub fn diagnostics(&self) -> Value {
        match self {
            RemoteError::Rejected { status, body } => json!({
                "status_code": status,
                "response": body,
            }),
            other => json!({ "error": other.to_string() }),
        }
    }
}
