// crates/core/src/lib.rs
//! Core types for the billstage sync subsystem
//!
//! This crate defines the vocabulary shared by every other crate in the
//! workspace: the tracked business tables, the typed entity records, the
//! change events staged on disk, and the aggregate upload results both
//! sync engines report.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use types::{
    AnalyticsEvent, ChangeAction, ChangeEvent, Customer, EntityRecord, FailureDetail,
    FailureRecord, Invoice, InvoiceItem, Item, TrackedTable, UploadResult, UploadedRecord,
};
