// crates/staging/src/capture.rs
//! Durable change capture for tracked-entity mutations
//!
//! Every successful local mutation is appended to the current day's
//! change-log file before its effects could otherwise be lost to a crash.
//! Capture is best-effort by contract: a disk failure here is logged and
//! swallowed so it can never abort the surrounding business mutation.

use crate::array_file::append_entry;
use crate::error::StagingResult;
use crate::layout::{LogKind, StagingLayout};
use billstage_core::{ChangeAction, ChangeEvent, EntityRecord};
use serde_json::{Map, Value};

/// Appends change events to the staging tree
///
/// This is the single local write path for capture; multi-writer conflict
/// semantics are deliberately last-write-observed-wins.
#[derive(Debug, Clone)]
pub struct ChangeCapture {
    layout: StagingLayout,
}

impl ChangeCapture {
    /// Creates a capture handle over a resolved staging layout
    pub fn new(layout: StagingLayout) -> Self {
        Self { layout }
    }

    /// The layout this capture writes into
    pub fn layout(&self) -> &StagingLayout {
        &self.layout
    }

    /// Records a tracked-entity mutation; never fails
    pub fn record(&self, action: ChangeAction, record: &EntityRecord) {
        match self.try_record(action, record) {
            Ok(()) => log::debug!("Captured {} {}", record.table(), action),
            Err(e) => log::error!(
                "Failed to capture {} {}: {}",
                record.table(),
                action,
                e
            ),
        }
    }

    /// Records a telemetry event under the `analytics` kind; never fails
    pub fn record_analytics(&self, data: Map<String, Value>) {
        let event = ChangeEvent::for_analytics(data);
        match self.append(LogKind::Analytics, &event) {
            Ok(()) => log::debug!("Captured analytics event"),
            Err(e) => log::error!("Failed to capture analytics event: {}", e),
        }
    }

    /// Fallible variant of [`record`](Self::record), used by tests
    pub fn try_record(
        &self,
        action: ChangeAction,
        record: &EntityRecord,
    ) -> StagingResult<()> {
        let event = ChangeEvent::for_entity(action, record)?;
        self.append(LogKind::Activity, &event)
    }

    fn append(&self, kind: LogKind, event: &ChangeEvent) -> StagingResult<()> {
        let path = self.layout.pending_file_today(kind);
        append_entry(&path, serde_json::to_value(event)?)
    }
}
