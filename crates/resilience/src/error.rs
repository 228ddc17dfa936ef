// crates/resilience/src/error.rs
//! Error types for resilience operations

use thiserror::Error;

/// Result type for resilience operations
pub type ResilienceResult<T> = Result<T, ResilienceError>;

/// Errors that can occur in resilience operations
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// All retry attempts exhausted
    #[error("All {attempts} retry attempts exhausted: {last_error}")]
    RetriesExhausted {
        /// How many attempts were made
        attempts: usize,
        /// Display form of the final failure
        last_error: String,
    },
}

impl ResilienceError {
    /// Returns the final underlying failure message
    pub fn last_error(&self) -> &str {
        match self {
            ResilienceError::RetriesExhausted { last_error, .. } => last_error,
        }
    }
}
