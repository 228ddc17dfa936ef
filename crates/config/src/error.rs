//! Error types for the configuration system

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read settings file
    #[error("Failed to read settings file at {path}: {source}")]
    ReadError {
        /// Settings file path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Failed to write settings file
    #[error("Failed to write settings file at {path}: {source}")]
    WriteError {
        /// Settings file path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Failed to parse settings file
    #[error("Failed to parse settings file at {path}: {source}")]
    ParseError {
        /// Settings file path
        path: PathBuf,
        /// TOML parse error
        source: toml::de::Error,
    },

    /// Failed to serialize settings
    #[error("Failed to serialize settings: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Settings contain invalid values
    #[error("Settings validation failed: {0}")]
    ValidationError(String),

    /// Failed to create a directory
    #[error("Failed to create directory at {path}: {source}")]
    DirectoryCreationError {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A platform directory could not be determined
    #[error("Could not determine directory path: {reason}")]
    PathResolutionError {
        /// Why resolution failed
        reason: String,
    },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
