// crates/sync-engine/src/normalize.rs
//! Datetime normalization for outbound payloads
//!
//! Local timestamps are serialized in RFC 3339 (`2026-01-02T10:30:00Z`),
//! but the remote columns expect the `2026-01-02 10:30:00+00` form.
//! Normalization rewrites only the known datetime fields and walks nested
//! structures so staged batches of any shape come out consistent.

use serde_json::Value;

/// Record fields holding datetimes on the wire
const DATETIME_FIELDS: [&str; 4] = ["timestamp", "createdAt", "updatedAt", "deletedAt"];

/// Rewrites datetime strings in-place, recursing through maps and arrays
pub fn normalize_timestamps(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if DATETIME_FIELDS.contains(&key.as_str()) {
                    if let Value::String(s) = field {
                        *s = normalize_str(s);
                        continue;
                    }
                }
                normalize_timestamps(field);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                normalize_timestamps(item);
            }
        }
        _ => {}
    }
}

fn normalize_str(s: &str) -> String {
    s.replace('T', " ").replace('Z', "+00")
}
