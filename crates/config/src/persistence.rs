//! File system persistence for sync settings
//!
//! Reads and writes the settings file with atomic writes (no partial or
//! corrupted files), directory creation, and graceful error handling.

use crate::{ConfigError, ConfigResult, SyncSettings};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Handles settings file persistence
pub struct SettingsPersistence {
    settings_path: PathBuf,
}

impl SettingsPersistence {
    /// Creates a new persistence handler for the given settings file path
    pub fn new(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Returns the settings file path
    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    /// Loads settings from file
    ///
    /// If the file doesn't exist, returns defaults. An empty or corrupted
    /// file is an error, never silently replaced.
    pub fn load(&self) -> ConfigResult<SyncSettings> {
        if !self.settings_path.exists() {
            log::info!(
                "Settings file not found at {}, using defaults",
                self.settings_path.display()
            );
            return Ok(SyncSettings::default());
        }

        let contents =
            fs::read_to_string(&self.settings_path).map_err(|e| ConfigError::ReadError {
                path: self.settings_path.clone(),
                source: e,
            })?;

        // An empty file is treated as corrupted, not as valid defaults
        if contents.trim().is_empty() {
            return Err(ConfigError::ReadError {
                path: self.settings_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Settings file is empty or contains only whitespace",
                ),
            });
        }

        let settings: SyncSettings =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: self.settings_path.clone(),
                source: e,
            })?;

        Ok(settings)
    }

    /// Saves settings to file, validating first
    ///
    /// Uses a temporary file and atomic rename so the settings file is
    /// never left in a corrupted state.
    pub fn save(&self, settings: &SyncSettings) -> ConfigResult<()> {
        settings.validate()?;

        if let Some(parent) = self.settings_path.parent() {
            ensure_directory_exists(parent)?;
        }

        let toml_string = toml::to_string_pretty(settings).map_err(ConfigError::SerializeError)?;

        let temp_file = self.create_temp_file()?;
        self.write_atomic(temp_file, &toml_string)?;

        log::info!("Settings saved to {}", self.settings_path.display());
        Ok(())
    }

    /// Creates a temporary file in the same directory as the settings file
    fn create_temp_file(&self) -> ConfigResult<NamedTempFile> {
        let dir = self
            .settings_path
            .parent()
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Settings path has no parent directory".to_string(),
            })?;

        NamedTempFile::new_in(dir).map_err(ConfigError::IoError)
    }

    /// Writes content to a temporary file and atomically renames it
    fn write_atomic(&self, mut temp_file: NamedTempFile, content: &str) -> ConfigResult<()> {
        temp_file
            .write_all(content.as_bytes())
            .map_err(ConfigError::IoError)?;
        temp_file.flush().map_err(ConfigError::IoError)?;

        temp_file
            .persist(&self.settings_path)
            .map_err(|e| ConfigError::WriteError {
                path: self.settings_path.clone(),
                source: e.error,
            })?;

        Ok(())
    }
}

/// Ensures a directory exists, creating it if necessary
pub(crate) fn ensure_directory_exists(path: &Path) -> ConfigResult<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| ConfigError::DirectoryCreationError {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::debug!("Created directory: {}", path.display());
    }
    Ok(())
}
