// crates/staging/src/lib.rs
//! Durable staging tree for captured change events
//!
//! This crate owns everything that touches the staging directory: the path
//! layout, best-effort change capture, pending-file enumeration and
//! archiving, failure records, the per-day audit log, and retention
//! pruning. The staging root itself is resolved by `billstage-config` and
//! passed in; nothing here holds global state.
//!
//! A change event is written once at capture time and consumed
//! destructively only when every sibling event in its file has been
//! acknowledged by the remote store, which is what gives the pipeline its
//! at-least-once delivery guarantee.

mod array_file;
mod audit;
mod capture;
mod error;
mod janitor;
mod layout;
mod log_store;

pub use audit::{append_audit_event, audit_payload, record_failure};
pub use capture::ChangeCapture;
pub use error::{StagingError, StagingResult};
pub use janitor::RetentionJanitor;
pub use layout::{LogKind, StagingLayout, ARCHIVE_DIR_NAME, AUDIT_LOG_FILE, FAILED_DIR_NAME};
pub use log_store::{archive_files, load_pending_files, PendingFile};
