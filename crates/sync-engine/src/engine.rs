// crates/sync-engine/src/engine.rs
//! Main sync engine

use crate::error::{SyncError, SyncResult};
use crate::types::{FullOutcome, IncrementalOutcome};
use crate::{full, incremental};
use billstage_database::BillingStore;
use billstage_remote::RemoteClient;
use billstage_resilience::RetryPolicy;
use billstage_staging::{append_audit_event, RetentionJanitor, StagingLayout};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

/// Configuration for the sync engine
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Account the audit rows are attributed to
    pub user_id: String,
    /// Records per bulk-upsert request in full runs
    pub chunk_size: usize,
    /// Attempts per chunk before a full run gives up on a table
    pub max_attempts: usize,
    /// Days archived and failed files are kept before pruning
    pub retention_days: u64,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            user_id: "guest".to_string(),
            chunk_size: 200,
            max_attempts: 3,
            retention_days: 7,
        }
    }
}

/// Main synchronization engine
///
/// Runs are serialized through an internal lock; a second caller waits
/// for the active run to finish rather than interleaving uploads.
pub struct SyncEngine {
    store: BillingStore,
    client: RemoteClient,
    layout: StagingLayout,
    options: SyncOptions,
    policy: RetryPolicy,
    janitor: RetentionJanitor,
    run_lock: Mutex<()>,
}

impl SyncEngine {
    /// Creates a new sync engine
    pub fn new(
        store: BillingStore,
        client: RemoteClient,
        layout: StagingLayout,
        options: SyncOptions,
    ) -> Self {
        let policy = RetryPolicy::new(options.max_attempts);
        let janitor = RetentionJanitor::new(options.retention_days);

        Self {
            store,
            client,
            layout,
            options,
            policy,
            janitor,
            run_lock: Mutex::new(()),
        }
    }

    /// The staging layout this engine replays from
    pub fn layout(&self) -> &StagingLayout {
        &self.layout
    }

    /// The engine configuration
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Replays all pending change events against the remote store.
    ///
    /// Per-record failures are persisted and reported in the outcome
    /// rather than aborting the run. Retention pruning runs afterwards
    /// regardless of how the replay went.
    pub async fn sync_incremental(&self) -> IncrementalOutcome {
        let _guard = self.run_lock.lock().await;
        log::info!("Starting incremental sync");

        let outcome = incremental::run(&self.client, &self.layout).await;

        self.post_audit_row(
            "incremental-db",
            outcome.db.uploaded,
            outcome.db.failed,
            outcome.db.is_clean(),
        )
        .await;
        self.post_audit_row(
            "incremental-analytics",
            outcome.analytics.uploaded,
            outcome.analytics.failed,
            outcome.analytics.is_clean(),
        )
        .await;

        let mut summary = Map::new();
        summary.insert("uploaded".to_string(), json!(outcome.uploaded()));
        summary.insert("failed".to_string(), json!(outcome.failed()));
        summary.insert(
            "archived".to_string(),
            json!(outcome.archived_db + outcome.archived_analytics),
        );
        append_audit_event(&self.layout, "incremental_upload_summary", summary);

        self.janitor.run(&self.layout);
        log::info!(
            "Incremental sync finished: {} uploaded, {} failed",
            outcome.uploaded(),
            outcome.failed()
        );
        outcome
    }

    /// Uploads a snapshot of every tracked table in referential order.
    ///
    /// Stops with [`SyncError::IntegrityStop`] at the first table that
    /// still has failed records after retries. Retention pruning runs
    /// afterwards in either case.
    pub async fn sync_full(&self) -> SyncResult<FullOutcome> {
        let _guard = self.run_lock.lock().await;
        log::info!("Starting full database sync");

        let run = full::run(
            &self.store,
            &self.client,
            &self.layout,
            self.options.chunk_size,
            &self.policy,
        )
        .await;

        match &run {
            Ok(outcome) => {
                self.post_audit_row("full", outcome.uploaded(), outcome.failed(), true)
                    .await;
                let mut summary = Map::new();
                summary.insert("uploaded".to_string(), json!(outcome.uploaded()));
                summary.insert("failed".to_string(), json!(outcome.failed()));
                summary.insert("tables".to_string(), json!(outcome.tables.len()));
                append_audit_event(&self.layout, "full_upload_summary", summary);
                log::info!("Full sync finished: {} uploaded", outcome.uploaded());
            }
            Err(SyncError::IntegrityStop {
                failed_table,
                skipped_tables,
                detail,
                table_results,
                ..
            }) => {
                let uploaded: usize = table_results.iter().map(|t| t.result.uploaded).sum();
                let failed: usize = table_results.iter().map(|t| t.result.failed).sum();
                self.post_audit_row("full", uploaded, failed, false).await;
                append_audit_event(
                    &self.layout,
                    "full_upload_stopped",
                    stop_summary(failed_table, uploaded, failed, skipped_tables, detail),
                );
            }
            Err(e) => {
                log::error!("Full sync failed before any upload: {}", e);
                self.post_audit_row("full", 0, 0, false).await;
            }
        }

        self.janitor.run(&self.layout);
        run
    }

    async fn post_audit_row(&self, mode: &str, uploaded: usize, failed: usize, clean: bool) {
        let row = json!({
            "user_id": self.options.user_id,
            "uploaded_at": Utc::now().to_rfc3339(),
            "records_uploaded": uploaded,
            "failed": failed,
            "folder": self.layout.root().display().to_string(),
            "status": if clean { "DONE" } else { "FAILED" },
            "mode": mode,
        });

        if let Err(e) = self.client.post_audit_log(&row).await {
            log::warn!("Could not post '{}' audit row: {}", mode, e);
            let mut payload = Map::new();
            payload.insert("mode".to_string(), json!(mode));
            payload.insert("error".to_string(), json!(e.to_string()));
            append_audit_event(&self.layout, "upload_log_post_failed", payload);
        }
    }
}

fn stop_summary(
    failed_table: &str,
    uploaded: usize,
    failed: usize,
    skipped_tables: &[String],
    detail: &Option<String>,
) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("failed_table".to_string(), json!(failed_table));
    payload.insert("uploaded".to_string(), json!(uploaded));
    payload.insert("failed".to_string(), json!(failed));
    payload.insert("skipped_tables".to_string(), json!(skipped_tables));
    payload.insert("detail".to_string(), json!(detail));
    payload
}
