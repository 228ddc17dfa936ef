// crates/sync-engine/src/lib.rs
//! Cloud synchronization engine
//!
//! Two complementary upload paths against the same remote store:
//! - Incremental: replays the staged change-log files event by event,
//!   archiving each file once all of its events are acknowledged.
//! - Full: snapshots every tracked table and bulk-upserts it in chunks,
//!   parents before children, stopping at the first table that fails.
//!
//! Both paths share the audit trail, the failure records, and the
//! retention pruning of the staging tree.

mod engine;
mod error;
mod full;
mod incremental;
mod normalize;
mod types;

pub use engine::{SyncEngine, SyncOptions};
pub use error::{SyncError, SyncResult};
pub use normalize::normalize_timestamps;
pub use types::{FullOutcome, IncrementalOutcome, TableReport};
