// crates/staging/src/janitor.rs
//! Retention pruning for the archive and failure subtrees

use crate::layout::StagingLayout;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Deletes archived and failed staging files past their retention window
///
/// Runs after every engine invocation, success or failure. Deletion errors
/// are logged and never raised; the next run simply tries again.
#[derive(Debug, Clone)]
pub struct RetentionJanitor {
    retention_days: u64,
}

impl RetentionJanitor {
    /// Creates a janitor with the given retention window in days
    pub fn new(retention_days: u64) -> Self {
        Self { retention_days }
    }

    /// Prunes the `sent/` and `failed/` subtrees using the configured window
    pub fn run(&self, layout: &StagingLayout) {
        let cutoff = SystemTime::now() - Duration::from_secs(self.retention_days * 24 * 60 * 60);
        self.prune_older_than(layout, cutoff);
    }

    /// Prunes with an explicit cutoff; files modified before it are deleted
    pub fn prune_older_than(&self, layout: &StagingLayout, cutoff: SystemTime) {
        let mut deleted = 0usize;
        for root in [layout.archive_root(), layout.failed_root()] {
            deleted += prune_tree(&root, cutoff);
        }
        if deleted > 0 {
            log::info!("Retention janitor deleted {} expired file(s)", deleted);
        }
        remove_empty_dirs(&layout.failed_root());
        remove_empty_dirs(&layout.archive_root());
    }
}

fn prune_tree(dir: &Path, cutoff: SystemTime) -> usize {
    let mut deleted = 0;
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        // Missing subtree just means nothing to prune yet
        Err(_) => return 0,
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            deleted += prune_tree(&path, cutoff);
            continue;
        }
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) if modified < cutoff => match fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(e) => log::warn!("Janitor could not delete {}: {}", path.display(), e),
            },
            Ok(_) => {}
            Err(e) => log::warn!("Janitor could not stat {}: {}", path.display(), e),
        }
    }
    deleted
}

/// Removes now-empty per-day directories left behind after pruning
fn remove_empty_dirs(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            remove_empty_dirs(&path);
            // Fails when non-empty, which is the point
            let _ = fs::remove_dir(&path);
        }
    }
}
