//! Sync settings: the remote endpoint and the engine knobs

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default bulk-upsert batch size for the full sync
pub const DEFAULT_CHUNK_SIZE: usize = 200;
/// Default number of attempts for a failing batch
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
/// Default retention window for archived and failed files, in days
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

/// Settings for the sync subsystem
///
/// Loaded from `settings.toml` in the platform config directory. Missing
/// fields fall back to defaults, so a minimal file only needs the remote
/// endpoint and key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Base URL of the remote store, e.g. `https://xyz.supabase.co`
    pub remote_url: String,
    /// API key, sent as both `apikey` and bearer token
    pub api_key: String,
    /// User identifier recorded in remote audit summaries
    pub user_id: String,
    /// Records per bulk-upsert batch during a full sync
    pub chunk_size: usize,
    /// Attempts per failing batch before giving up
    pub max_attempts: usize,
    /// Days to keep archived and failed staging files
    pub retention_days: u64,
    /// Explicit staging root; overrides platform resolution when set
    pub staging_root: Option<PathBuf>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            remote_url: String::new(),
            api_key: String::new(),
            user_id: "guest".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retention_days: DEFAULT_RETENTION_DAYS,
            staging_root: None,
        }
    }
}

impl SyncSettings {
    /// Validates the settings, returning the first problem found
    pub fn validate(&self) -> ConfigResult<()> {
        if self.remote_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "remote_url must not be empty".to_string(),
            ));
        }
        if !self.remote_url.starts_with("http://") && !self.remote_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "remote_url must be an http(s) URL, got '{}'",
                self.remote_url
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api_key must not be empty".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "max_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> SyncSettings {
        SyncSettings {
            remote_url: "https://example.supabase.co".to_string(),
            api_key: "service-key".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = SyncSettings::default();
        assert_eq!(settings.user_id, "guest");
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(settings.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(settings.retention_days, DEFAULT_RETENTION_DAYS);
        assert!(settings.staging_root.is_none());
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_empty_url_rejected() {
        let settings = SyncSettings {
            remote_url: String::new(),
            ..valid_settings()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_non_http_url_rejected() {
        let settings = SyncSettings {
            remote_url: "ftp://example.com".to_string(),
            ..valid_settings()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let settings = SyncSettings {
            chunk_size: 0,
            ..valid_settings()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: SyncSettings =
            toml::from_str("remote_url = \"https://x.co\"\napi_key = \"k\"").unwrap();
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(settings.user_id, "guest");
    }
}
