// crates/remote/src/lib.rs
//! HTTP client for the remote store's REST surface

mod client;
mod connectivity;
mod error;

pub use client::{RemoteClient, RemoteConfig, AUDIT_LOG_TABLE};
pub use connectivity::ConnectivityChecker;
pub use error::{RemoteError, RemoteResult};
