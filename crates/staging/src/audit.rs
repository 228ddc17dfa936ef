// crates/staging/src/audit.rs
//! Local audit trail: per-day event log and persisted failure records

use crate::array_file::append_entry;
use crate::layout::StagingLayout;
use billstage_core::{ChangeAction, FailureRecord};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::fs;

/// Appends one event to today's `upload_events.json`; best-effort
///
/// Every event carries a `timestamp` and a `kind` plus the caller's
/// payload fields. Audit writes never fail the operation they describe.
pub fn append_audit_event(layout: &StagingLayout, kind: &str, payload: Map<String, Value>) {
    let mut event = Map::new();
    event.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));
    event.insert("kind".to_string(), json!(kind));
    event.extend(payload);

    let path = layout.audit_log_today();
    if let Err(e) = append_entry(&path, Value::Object(event)) {
        log::error!("Failed to append audit event '{}': {}", kind, e);
    }
}

/// Convenience for single-field audit payloads
pub fn audit_payload(key: &str, value: impl Into<Value>) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(key.to_string(), value.into());
    payload
}

/// Persists a failure record for one rejected transmission; best-effort
///
/// Writes `failed_{table}_{ts}.json` under today's failure directory and
/// appends a `record_upload_failed` audit event pointing at it.
pub fn record_failure(
    layout: &StagingLayout,
    table: &str,
    action: ChangeAction,
    record: Map<String, Value>,
    details: Value,
) {
    let failure = FailureRecord {
        timestamp: Utc::now(),
        table: table.to_string(),
        action,
        record,
        details: details.clone(),
    };

    let path = layout.failure_record_path(table);
    match write_failure_file(&path, &failure) {
        Ok(()) => {
            let mut payload = Map::new();
            payload.insert("file".to_string(), json!(path.display().to_string()));
            payload.insert("table".to_string(), json!(table));
            payload.insert("details".to_string(), details);
            append_audit_event(layout, "record_upload_failed", payload);
        }
        Err(e) => {
            log::error!("Failed to persist failure record for {}: {}", table, e);
            append_audit_event(
                layout,
                "failed_record_write_exception",
                audit_payload("error", e.to_string()),
            );
        }
    }
}

fn write_failure_file(
    path: &std::path::Path,
    failure: &FailureRecord,
) -> crate::error::StagingResult<()> {
    use crate::error::StagingError;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StagingError::io(parent, e))?;
    }
    let body = serde_json::to_string_pretty(failure)?;
    fs::write(path, body).map_err(|e| StagingError::io(path, e))
}
