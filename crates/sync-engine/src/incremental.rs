// crates/sync-engine/src/incremental.rs
//! Incremental replay of staged change events
//!
//! Each pending change-log file is replayed entry by entry against the
//! remote store. A file is archived only when every one of its entries
//! was acknowledged; a file with any failure stays pending so the next
//! run picks its events up again.

use crate::normalize::normalize_timestamps;
use crate::types::IncrementalOutcome;
use billstage_core::{ChangeAction, UploadResult};
use billstage_remote::RemoteClient;
use billstage_staging::{
    archive_files, load_pending_files, record_failure, LogKind, PendingFile, StagingLayout,
};
use serde_json::{Map, Value};
use std::path::PathBuf;

pub(crate) async fn run(client: &RemoteClient, layout: &StagingLayout) -> IncrementalOutcome {
    let mut outcome = IncrementalOutcome::default();

    let (db, archived_db) = replay_kind(client, layout, LogKind::Activity).await;
    outcome.db = db;
    outcome.archived_db = archived_db;

    let (analytics, archived_analytics) = replay_kind(client, layout, LogKind::Analytics).await;
    outcome.analytics = analytics;
    outcome.archived_analytics = archived_analytics;

    outcome
}

async fn replay_kind(
    client: &RemoteClient,
    layout: &StagingLayout,
    kind: LogKind,
) -> (UploadResult, usize) {
    let files = load_pending_files(layout, kind);
    let mut result = UploadResult::new();
    let mut completed: Vec<PathBuf> = Vec::new();

    for file in &files {
        let before_failed = result.failed;
        replay_file(client, layout, file, &mut result).await;
        if result.failed == before_failed {
            completed.push(file.path.clone());
        } else {
            log::warn!(
                "Keeping {} pending: not all events were delivered",
                file.path.display()
            );
        }
    }

    let archived = archive_files(layout, kind, &completed);
    (result, archived)
}

async fn replay_file(
    client: &RemoteClient,
    layout: &StagingLayout,
    file: &PendingFile,
    result: &mut UploadResult,
) {
    for entry in &file.entries {
        let Some(table) = entry.get("table").and_then(Value::as_str) else {
            log::debug!("Skipping entry without table in {}", file.path.display());
            continue;
        };
        let table = table.to_string();

        let action = ChangeAction::parse_lenient(
            entry.get("action").and_then(Value::as_str).unwrap_or(""),
        );
        let data = match entry.get("data") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };

        let mut payload = Value::Object(data);
        normalize_timestamps(&mut payload);
        let Value::Object(data) = payload else {
            continue;
        };

        let sent = match action {
            ChangeAction::Insert => client.insert_record(&table, &data).await,
            ChangeAction::Update => client.update_record(&table, &data).await,
            ChangeAction::Delete => client.delete_record(&table, &data).await,
        };

        match sent {
            Ok(()) => result.record_success(&table, action, data),
            Err(e) => {
                log::error!("Failed to replay {} {} event: {}", table, action, e);
                let diagnostics = e.diagnostics();
                record_failure(layout, &table, action, data.clone(), diagnostics.clone());
                result.record_failure(&table, action, data, diagnostics);
            }
        }
    }
}
