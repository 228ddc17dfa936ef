// crates/staging/src/log_store.rs
//! Enumeration, parsing, and archiving of pending change-log files

use crate::audit::{append_audit_event, audit_payload};
use crate::layout::{LogKind, StagingLayout};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// One pending change-log file with its flattened event entries
#[derive(Debug, Clone)]
pub struct PendingFile {
    /// Path of the source file under the pending directory
    pub path: PathBuf,
    /// Events in file order
    pub entries: Vec<Value>,
}

/// Loads every pending `*.json` file of a kind, sorted by file name
///
/// Tolerates the legacy shapes older writers produced: nested arrays are
/// flattened one level, and a bare object becomes a single entry. Files
/// that cannot be read or parsed are audited and skipped, leaving them in
/// place for inspection. Files with no entries are skipped entirely.
pub fn load_pending_files(layout: &StagingLayout, kind: LogKind) -> Vec<PendingFile> {
    let dir = layout.pending_dir(kind);
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut paths: Vec<PathBuf> = match fs::read_dir(&dir) {
        Ok(iter) => iter
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect(),
        Err(e) => {
            log::warn!("Could not list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };
    paths.sort();

    let mut files = Vec::new();
    for path in paths {
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                audit_read_failure(layout, &path, &e.to_string());
                continue;
            }
        };
        let parsed: Value = match serde_json::from_str(&contents) {
            Ok(v) => v,
            Err(e) => {
                audit_read_failure(layout, &path, &e.to_string());
                continue;
            }
        };

        let entries = flatten_entries(parsed);
        if !entries.is_empty() {
            files.push(PendingFile { path, entries });
        }
    }
    files
}

fn flatten_entries(parsed: Value) -> Vec<Value> {
    match parsed {
        Value::Array(outer) => {
            let mut entries = Vec::new();
            for entry in outer {
                match entry {
                    // Legacy writers staged whole batches as nested arrays
                    Value::Array(inner) => entries.extend(inner),
                    other => entries.push(other),
                }
            }
            entries
        }
        Value::Object(_) => vec![parsed],
        _ => Vec::new(),
    }
}

fn audit_read_failure(layout: &StagingLayout, path: &std::path::Path, error: &str) {
    log::warn!("Skipping unreadable change log {}: {}", path.display(), error);
    let mut payload = audit_payload("file", path.display().to_string());
    payload.insert("error".to_string(), Value::String(error.to_string()));
    append_audit_event(layout, "read_file_exception", payload);
}

/// Moves fully-synced files into the archive subtree for their kind
///
/// An existing archive file with the same name is replaced. A failed move
/// is audited and the file is left pending, so the next run retries it.
/// Returns how many files were archived.
pub fn archive_files(layout: &StagingLayout, kind: LogKind, files: &[PathBuf]) -> usize {
    if files.is_empty() {
        return 0;
    }

    let archive_dir = layout.archive_dir(kind);
    if let Err(e) = fs::create_dir_all(&archive_dir) {
        log::error!("Could not create {}: {}", archive_dir.display(), e);
        return 0;
    }

    let mut archived = 0;
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = archive_dir.join(name);
        let moved = || -> std::io::Result<()> {
            if target.exists() {
                fs::remove_file(&target)?;
            }
            fs::rename(file, &target)
        }();
        match moved {
            Ok(()) => archived += 1,
            Err(e) => {
                log::error!("Failed to archive {}: {}", file.display(), e);
                let mut payload = audit_payload("file", file.display().to_string());
                payload.insert("error".to_string(), Value::String(e.to_string()));
                append_audit_event(layout, "archive_move_failed", payload);
            }
        }
    }
    archived
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn write_pending(layout: &StagingLayout, kind: LogKind, name: &str, body: &str) -> PathBuf {
        let dir = layout.pending_dir(kind);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_loads_files_sorted_with_entries() {
        let dir = TempDir::new().unwrap();
        let layout = StagingLayout::new(dir.path());
        write_pending(
            &layout,
            LogKind::Activity,
            "activity_2026_01_02.json",
            r#"[{"table":"customer","action":"insert","data":{"id":2}}]"#,
        );
        write_pending(
            &layout,
            LogKind::Activity,
            "activity_2026_01_01.json",
            r#"[{"table":"customer","action":"insert","data":{"id":1}}]"#,
        );

        let files = load_pending_files(&layout, LogKind::Activity);
        assert_eq!(files.len(), 2);
        assert!(files[0].path.ends_with("activity_2026_01_01.json"));
        assert_eq!(files[0].entries[0]["data"]["id"], 1);
    }

    #[test]
    fn test_flattens_legacy_nested_arrays() {
        let dir = TempDir::new().unwrap();
        let layout = StagingLayout::new(dir.path());
        write_pending(
            &layout,
            LogKind::Activity,
            "activity_legacy.json",
            r#"[[{"table":"item","data":{}}],{"table":"customer","data":{}}]"#,
        );

        let files = load_pending_files(&layout, LogKind::Activity);
        assert_eq!(files[0].entries.len(), 2);
    }

    #[test]
    fn test_bare_object_becomes_single_entry() {
        let dir = TempDir::new().unwrap();
        let layout = StagingLayout::new(dir.path());
        write_pending(
            &layout,
            LogKind::Analytics,
            "analytics_one.json",
            r#"{"table":"analytics","data":{}}"#,
        );

        let files = load_pending_files(&layout, LogKind::Analytics);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].entries.len(), 1);
    }

    #[test]
    fn test_unparseable_file_is_skipped_and_audited() {
        let dir = TempDir::new().unwrap();
        let layout = StagingLayout::new(dir.path());
        write_pending(&layout, LogKind::Activity, "broken.json", "{ nope");
        write_pending(
            &layout,
            LogKind::Activity,
            "good.json",
            r#"[{"table":"customer","data":{}}]"#,
        );

        let files = load_pending_files(&layout, LogKind::Activity);
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("good.json"));

        let events =
            crate::array_file::read_array_or_empty(&layout.audit_log_today());
        assert!(events.iter().any(|e| e["kind"] == "read_file_exception"));
    }

    #[test]
    fn test_archive_moves_files_and_clobbers_existing() {
        let dir = TempDir::new().unwrap();
        let layout = StagingLayout::new(dir.path());
        let path = write_pending(&layout, LogKind::Activity, "activity_a.json", "[]");

        // Pre-existing archived file with the same name
        let archive_dir = layout.archive_dir(LogKind::Activity);
        fs::create_dir_all(&archive_dir).unwrap();
        fs::write(archive_dir.join("activity_a.json"), "old").unwrap();

        let archived = archive_files(&layout, LogKind::Activity, &[path.clone()]);
        assert_eq!(archived, 1);
        assert!(!path.exists());
        let moved = fs::read_to_string(archive_dir.join("activity_a.json")).unwrap();
        assert_eq!(moved, "[]");
    }

    #[test]
    fn test_missing_pending_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let layout = StagingLayout::new(dir.path().join("nothing-here"));
        assert!(load_pending_files(&layout, LogKind::Activity).is_empty());
    }
}
