// crates/staging/src/error.rs
//! Error types for staging-tree operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type for staging operations
pub type StagingResult<T> = Result<T, StagingError>;

/// Errors that can occur while reading or writing the staging tree
///
/// Most public entry points swallow these after logging, because capture
/// and audit writes are best-effort by contract. The typed errors exist
/// for the internal operations and for tests.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Filesystem operation failed
    #[error("Staging I/O error at {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Staged content could not be serialized or parsed
    #[error("Staging serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StagingError {
    /// Wraps an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StagingError::Io {
            path: path.into(),
            source,
        }
    }
}
