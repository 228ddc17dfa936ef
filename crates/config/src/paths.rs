//! Platform path resolution for settings and the staging root
//!
//! The staging root is resolved exactly once at startup and then passed
//! explicitly into the capture layer and both sync engines; nothing below
//! this module re-resolves it.

use crate::persistence::ensure_directory_exists;
use crate::{ConfigError, ConfigResult, SyncSettings};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Environment variable overriding the staging root, mainly for tests
/// and portable installs
pub const STAGING_DIR_ENV: &str = "BILLSTAGE_STAGING_DIR";

const APP_NAME: &str = "billstage";
const STAGING_DIR_NAME: &str = "logs";

/// Returns the default settings file path
///
/// Follows the platform conventions:
/// - Linux: `~/.config/billstage/settings.toml`
/// - macOS: `~/Library/Application Support/billstage/settings.toml`
/// - Windows: `%APPDATA%\billstage\settings.toml`
pub fn default_settings_path() -> ConfigResult<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .ok_or_else(|| ConfigError::PathResolutionError {
            reason: "Could not determine user config directory".to_string(),
        })
}

/// Resolves the durable staging root for change-log files
///
/// Resolution order:
/// 1. `settings.staging_root`, when set
/// 2. the `BILLSTAGE_STAGING_DIR` environment variable
/// 3. `{platform data dir}/billstage/logs`
/// 4. `./logs` as a last resort
///
/// The resolved directory is created before it is returned.
pub fn resolve_staging_root(settings: &SyncSettings) -> ConfigResult<PathBuf> {
    let root = if let Some(explicit) = &settings.staging_root {
        explicit.clone()
    } else if let Some(from_env) = std::env::var_os(STAGING_DIR_ENV) {
        PathBuf::from(from_env)
    } else if let Some(dirs) = ProjectDirs::from("", "", APP_NAME) {
        dirs.data_dir().join(STAGING_DIR_NAME)
    } else {
        log::warn!("No platform data directory available, staging under ./logs");
        PathBuf::from(STAGING_DIR_NAME)
    };

    ensure_directory_exists(&root)?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_root_wins() {
        let temp_dir = TempDir::new().unwrap();
        let explicit = temp_dir.path().join("staging");
        let settings = SyncSettings {
            staging_root: Some(explicit.clone()),
            ..Default::default()
        };

        let resolved = resolve_staging_root(&settings).unwrap();
        assert_eq!(resolved, explicit);
        assert!(resolved.is_dir());
    }

    #[test]
    fn test_default_settings_path_ends_with_file_name() {
        if let Ok(path) = default_settings_path() {
            assert!(path.ends_with("settings.toml"));
        }
    }
}
