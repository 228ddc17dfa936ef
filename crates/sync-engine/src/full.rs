// crates/sync-engine/src/full.rs
//! Full-database upload in referential order
//!
//! Snapshots every tracked table and upserts it in fixed chunks, parents
//! before children. A table whose records cannot be delivered after
//! retries stops the run before any later table is attempted, since those
//! tables reference rows the remote store never received.

use crate::error::{SyncError, SyncResult};
use crate::normalize::normalize_timestamps;
use crate::types::{FullOutcome, TableReport};
use billstage_core::{ChangeAction, TrackedTable, UploadResult};
use billstage_database::BillingStore;
use billstage_remote::RemoteClient;
use billstage_resilience::{with_retry, RetryPolicy};
use billstage_staging::{record_failure, StagingLayout};
use serde_json::{json, Value};
use std::cell::RefCell;

pub(crate) async fn run(
    store: &BillingStore,
    client: &RemoteClient,
    layout: &StagingLayout,
    chunk_size: usize,
    policy: &RetryPolicy,
) -> SyncResult<FullOutcome> {
    let chunk_size = chunk_size.max(1);
    let mut outcome = FullOutcome::default();

    for (position, table) in TrackedTable::SYNC_ORDER.iter().enumerate() {
        let report = upload_table(store, client, layout, *table, chunk_size, policy).await?;
        let failed = report.result.failed;
        outcome.tables.push(report);

        if failed > 0 {
            let skipped: Vec<String> = TrackedTable::SYNC_ORDER[position + 1..]
                .iter()
                .map(|t| t.as_str().to_string())
                .collect();
            let detail = outcome
                .tables
                .last()
                .and_then(|r| r.result.failure_details.first())
                .and_then(|d| d.message());
            log::error!(
                "Full sync stopping at '{}': {} record(s) failed, skipping [{}]",
                table,
                failed,
                skipped.join(", ")
            );
            return Err(SyncError::IntegrityStop {
                failed_table: table.as_str().to_string(),
                failed_count: failed,
                skipped_tables: skipped,
                detail,
                table_results: outcome.tables,
            });
        }
    }

    Ok(outcome)
}

async fn upload_table(
    store: &BillingStore,
    client: &RemoteClient,
    layout: &StagingLayout,
    table: TrackedTable,
    chunk_size: usize,
    policy: &RetryPolicy,
) -> SyncResult<TableReport> {
    let mut rows = store.snapshot(table).await?;
    for row in &mut rows {
        let mut value = Value::Object(std::mem::take(row));
        normalize_timestamps(&mut value);
        if let Value::Object(map) = value {
            *row = map;
        }
    }

    let table_name = table.as_str();
    let mut result = UploadResult::new();
    let mut chunks = 0;

    for chunk in rows.chunks(chunk_size) {
        chunks += 1;
        // Keeps the diagnostics of the last rejection, which the retry
        // helper reduces to a display string
        let last_diagnostics: RefCell<Option<Value>> = RefCell::new(None);
        let diagnostics_sink = &last_diagnostics;

        let sent = with_retry(policy, || async move {
            match client.bulk_upsert(table_name, chunk).await {
                Ok(()) => Ok(true),
                Err(e) if e.is_retryable() => {
                    *diagnostics_sink.borrow_mut() = Some(e.diagnostics());
                    Err(e)
                }
                // A definitive rejection will not get better on retry
                Err(e) => {
                    *diagnostics_sink.borrow_mut() = Some(e.diagnostics());
                    Ok(false)
                }
            }
        })
        .await;

        match sent {
            Ok(true) => {
                for record in chunk {
                    result.record_success(table_name, ChangeAction::Insert, record.clone());
                }
                continue;
            }
            Ok(false) => {
                log::error!(
                    "Chunk {} of '{}' was rejected by the remote store",
                    chunks,
                    table_name
                );
            }
            Err(exhausted) => {
                log::error!(
                    "Chunk {} of '{}' failed after retries: {}",
                    chunks,
                    table_name,
                    exhausted
                );
            }
        }

        let diagnostics = last_diagnostics
            .into_inner()
            .unwrap_or_else(|| json!({"error": "chunk delivery failed"}));
        for record in chunk {
            record_failure(
                layout,
                table_name,
                ChangeAction::Insert,
                record.clone(),
                diagnostics.clone(),
            );
            result.record_failure(
                table_name,
                ChangeAction::Insert,
                record.clone(),
                diagnostics.clone(),
            );
        }
    }

    log::info!(
        "Uploaded table '{}': {} ok, {} failed in {} chunk(s)",
        table_name,
        result.uploaded,
        result.failed,
        chunks
    );

    Ok(TableReport {
        table: table_name.to_string(),
        chunks,
        result,
    })
}
