// crates/staging/src/array_file.rs
//! Read-modify-write helpers for JSON-array staging files
//!
//! Pending and audit files are pretty-printed JSON arrays that are appended
//! to by rewriting the whole file. Corrupt or non-array content is replaced
//! by a fresh array rather than failing the append; the staged events are
//! worth more than the broken file.

use crate::error::{StagingError, StagingResult};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Reads a JSON array from `path`, healing missing/corrupt/non-array content
pub(crate) fn read_array_or_empty(path: &Path) -> Vec<Value> {
    if !path.exists() {
        return Vec::new();
    }
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                log::warn!(
                    "Staging file {} did not contain an array, starting fresh",
                    path.display()
                );
                Vec::new()
            }
            Err(e) => {
                log::warn!(
                    "Staging file {} is not valid JSON ({}), starting fresh",
                    path.display(),
                    e
                );
                Vec::new()
            }
        },
        Err(e) => {
            log::warn!("Could not read staging file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Writes `entries` to `path` as a pretty-printed JSON array
pub(crate) fn write_array(path: &Path, entries: &[Value]) -> StagingResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StagingError::io(parent, e))?;
    }
    let body = serde_json::to_string_pretty(entries)?;
    fs::write(path, body).map_err(|e| StagingError::io(path, e))
}

/// Appends one entry to the JSON array at `path`
pub(crate) fn append_entry(path: &Path, entry: Value) -> StagingResult<()> {
    let mut entries = read_array_or_empty(path);
    entries.push(entry);
    write_array(path, &entries)
}
