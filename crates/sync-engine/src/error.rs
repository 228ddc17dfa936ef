// crates/sync-engine/src/error.rs
//! Error types for sync operations

use crate::types::TableReport;
use thiserror::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local persistence failed
    #[error("Local store error: {0}")]
    Store(#[from] billstage_core::AppError),

    /// The remote store could not be used at all
    #[error("Remote store error: {0}")]
    Remote(#[from] billstage_remote::RemoteError),

    /// A full sync stopped at a table to protect referential order.
    ///
    /// Once any record of a table fails its retries, uploading later
    /// tables would orphan children on the remote side, so the run stops
    /// before them and reports what was skipped.
    #[error("Full sync stopped at table '{failed_table}': {failed_count} record(s) failed")]
    IntegrityStop {
        /// Table whose upload failed
        failed_table: String,
        /// Number of records that failed in that table
        failed_count: usize,
        /// Tables that were not attempted
        skipped_tables: Vec<String>,
        /// Short diagnostic from the first failure, when one was extractable
        detail: Option<String>,
        /// Per-table results up to and including the failed table
        table_results: Vec<TableReport>,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
