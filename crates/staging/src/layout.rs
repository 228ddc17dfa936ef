// crates/staging/src/layout.rs
//! Path layout of the on-disk staging tree
//!
//! ```text
//! {root}/activity/activity_{YYYY_MM_DD}.json    pending DB change events
//! {root}/analytics/analytics_{YYYY_MM_DD}.json  pending telemetry events
//! {root}/sent/{activity|analytics}/...          archived, fully-synced files
//! {root}/failed/{DD-MM-YYYY}/failed_{table}_{ts}.json
//! {root}/failed/{DD-MM-YYYY}/upload_events.json
//! ```

use chrono::Local;
use std::path::{Path, PathBuf};

/// Name of the archive subtree
pub const ARCHIVE_DIR_NAME: &str = "sent";
/// Name of the failure subtree
pub const FAILED_DIR_NAME: &str = "failed";
/// Per-day audit log file name
pub const AUDIT_LOG_FILE: &str = "upload_events.json";

/// The two kinds of pending change-log files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Database change events captured from tracked-entity mutations
    Activity,
    /// Telemetry events, same format, not tied to a local table
    Analytics,
}

impl LogKind {
    /// Directory (and file prefix) for this kind
    pub fn dir_name(&self) -> &'static str {
        match self {
            LogKind::Activity => "activity",
            LogKind::Analytics => "analytics",
        }
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Pure path helper over a resolved staging root
///
/// Owns no file handles and performs no I/O except directory creation in
/// the `ensure_*` helpers; everything else just joins paths.
#[derive(Debug, Clone)]
pub struct StagingLayout {
    root: PathBuf,
}

impl StagingLayout {
    /// Creates a layout over an already-resolved staging root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The staging root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of pending files for a kind
    pub fn pending_dir(&self, kind: LogKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Today's pending change-log file for a kind
    pub fn pending_file_today(&self, kind: LogKind) -> PathBuf {
        let day = Local::now().format("%Y_%m_%d");
        self.pending_dir(kind)
            .join(format!("{}_{}.json", kind.dir_name(), day))
    }

    /// Root of the archive subtree
    pub fn archive_root(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR_NAME)
    }

    /// Archive directory for a kind
    pub fn archive_dir(&self, kind: LogKind) -> PathBuf {
        self.archive_root().join(kind.dir_name())
    }

    /// Root of the failure subtree
    pub fn failed_root(&self) -> PathBuf {
        self.root.join(FAILED_DIR_NAME)
    }

    /// Today's failure directory, `failed/{DD-MM-YYYY}`
    pub fn failed_dir_today(&self) -> PathBuf {
        self.failed_root()
            .join(Local::now().format("%d-%m-%Y").to_string())
    }

    /// Today's audit log file
    pub fn audit_log_today(&self) -> PathBuf {
        self.failed_dir_today().join(AUDIT_LOG_FILE)
    }

    /// Path for a new failure record for the given table
    pub fn failure_record_path(&self, table: &str) -> PathBuf {
        let ts = Local::now().format("%Y%m%d_%H%M%S%6f");
        self.failed_dir_today()
            .join(format!("failed_{}_{}.json", table, ts))
    }
}
