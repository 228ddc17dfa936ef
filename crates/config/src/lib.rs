//! Billstage configuration
//!
//! Settings for the sync subsystem plus the platform path resolution for
//! the durable staging root.
//!
//! - **Atomic writes**: the settings file is never left in a corrupted state
//! - **Graceful defaults**: a missing file yields defaults; a corrupt one
//!   is an error, never silently replaced
//! - **Explicit staging root**: resolved once, passed everywhere by value
//!
//! # Example
//!
//! ```rust,no_run
//! use billstage_config::{default_settings_path, resolve_staging_root, SettingsPersistence};
//!
//! let persistence = SettingsPersistence::new(default_settings_path()?);
//! let settings = persistence.load()?;
//! let staging_root = resolve_staging_root(&settings)?;
//! println!("staging under {}", staging_root.display());
//! # Ok::<(), billstage_config::ConfigError>(())
//! ```

mod error;
mod paths;
mod persistence;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use paths::{default_settings_path, resolve_staging_root, STAGING_DIR_ENV};
pub use persistence::SettingsPersistence;
pub use settings::{
    SyncSettings, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETENTION_DAYS,
};
