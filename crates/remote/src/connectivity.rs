// crates/remote/src/connectivity.rs
//! Reachability checks against the configured remote store

use crate::client::RemoteClient;
use crate::error::{RemoteError, RemoteResult};

/// Pre-flight reachability check used before starting a sync run
#[derive(Debug, Clone)]
pub struct ConnectivityChecker {
    client: RemoteClient,
}

impl ConnectivityChecker {
    /// Creates a checker bound to a remote client
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    /// Returns true if the remote store answers at all
    pub async fn is_online(&self) -> bool {
        self.client.is_reachable().await
    }

    /// Checks reachability and returns an error when offline
    pub async fn check(&self) -> RemoteResult<()> {
        if self.is_online().await {
            Ok(())
        } else {
            Err(RemoteError::Unavailable)
        }
    }
}
