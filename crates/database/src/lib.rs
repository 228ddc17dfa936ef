//! Billstage Database Layer
//!
//! Local persistence for the billing tables, with every committed
//! mutation captured into the staging tree for later synchronization.
//! Uses SQLite through sqlx.

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod store;

pub use connection::DbPool;
pub use migrations::{current_version, run_migrations, verify_integrity};
pub use store::{BillingStore, NewCustomer, NewInvoice, NewInvoiceLine, NewItem};
