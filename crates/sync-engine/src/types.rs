// crates/sync-engine/src/types.rs
//! Outcome types reported by sync runs

use billstage_core::UploadResult;
use serde::{Deserialize, Serialize};

/// Outcome of one incremental run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncrementalOutcome {
    /// Result over all replayed business-change events
    pub db: UploadResult,
    /// Result over all replayed telemetry events
    pub analytics: UploadResult,
    /// Number of change-log files archived
    pub archived_db: usize,
    /// Number of telemetry files archived
    pub archived_analytics: usize,
}

impl IncrementalOutcome {
    /// Total records attempted across both kinds
    pub fn attempted(&self) -> usize {
        self.db.attempted() + self.analytics.attempted()
    }

    /// Total records delivered across both kinds
    pub fn uploaded(&self) -> usize {
        self.db.uploaded + self.analytics.uploaded
    }

    /// Total records that failed across both kinds
    pub fn failed(&self) -> usize {
        self.db.failed + self.analytics.failed
    }

    /// Returns true if every attempted record was delivered
    pub fn is_clean(&self) -> bool {
        self.db.is_clean() && self.analytics.is_clean()
    }
}

/// Result for one table within a full run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    /// Table name
    pub table: String,
    /// Number of chunk requests issued
    pub chunks: usize,
    /// Upload result over the table's snapshot
    pub result: UploadResult,
}

/// Outcome of one full-database run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullOutcome {
    /// Per-table results in upload order
    pub tables: Vec<TableReport>,
}

impl FullOutcome {
    /// Total records delivered across all tables
    pub fn uploaded(&self) -> usize {
        self.tables.iter().map(|t| t.result.uploaded).sum()
    }

    /// Total records that failed across all tables
    pub fn failed(&self) -> usize {
        self.tables.iter().map(|t| t.result.failed).sum()
    }
}
