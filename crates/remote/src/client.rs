// crates/remote/src/client.rs
//! REST client for the remote store
//!
//! The remote store speaks the PostgREST dialect: one route per table
//! under `/rest/v1/`, filters in the query string, and upsert conflict
//! handling selected through the `Prefer` header.

use crate::error::{RemoteError, RemoteResult};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde_json::{Map, Value};
use std::time::Duration;

/// Table receiving one audit row per engine run
pub const AUDIT_LOG_TABLE: &str = "upload_logs";

/// Remote store configuration
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the remote project, without the `/rest/v1` suffix
    pub base_url: String,
    /// Service key sent as both `apikey` and bearer token
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Creates a configuration with the default timeout
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Overrides the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client bound to one remote store
#[derive(Debug, Clone)]
pub struct RemoteClient {
    inner: ReqwestClient,
    base_url: String,
    api_key: String,
}

impl RemoteClient {
    /// Creates a client from a validated configuration
    pub fn new(config: RemoteConfig) -> RemoteResult<Self> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(RemoteError::InvalidUrl(config.base_url));
        }

        let inner = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(format!("Billstage/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RemoteError::Http)?;

        Ok(Self {
            inner,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    /// The configured base URL, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Inserts one record with duplicate merging
    pub async fn insert_record(
        &self,
        table: &str,
        record: &Map<String, Value>,
    ) -> RemoteResult<()> {
        let response = self
            .request(Method::POST, table)
            .json(record)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Updates one record, addressed by its `id` field
    pub async fn update_record(
        &self,
        table: &str,
        record: &Map<String, Value>,
    ) -> RemoteResult<()> {
        let id = record_id(table, record)?;
        let response = self
            .request(Method::PATCH, table)
            .query(&[("id", format!("eq.{}", id))])
            .json(record)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Deletes one record, addressed by its `id` field
    pub async fn delete_record(
        &self,
        table: &str,
        record: &Map<String, Value>,
    ) -> RemoteResult<()> {
        let id = record_id(table, record)?;
        let response = self
            .request(Method::DELETE, table)
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;
        Self::check(response).await
    }

    /// Upserts a batch of records in one request
    pub async fn bulk_upsert(&self, table: &str, records: &[Map<String, Value>]) -> RemoteResult<()> {
        let response = self
            .request(Method::POST, table)
            .json(records)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Posts one audit row describing an engine run
    pub async fn post_audit_log(&self, payload: &Value) -> RemoteResult<()> {
        let response = self
            .request(Method::POST, AUDIT_LOG_TABLE)
            .json(payload)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Probes the REST root; any HTTP answer counts as reachable
    pub async fn is_reachable(&self) -> bool {
        let url = format!("{}/rest/v1/", self.base_url);
        self.inner
            .head(&url)
            .header("apikey", &self.api_key)
            .send()
            .await
            .is_ok()
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.inner
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "resolution=merge-duplicates")
    }

    async fn check(response: Response) -> RemoteResult<()> {
        let status = response.status().as_u16();
        if matches!(status, 200 | 201 | 204) {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Err(RemoteError::Rejected { status, body })
    }
}

fn record_id<'a>(table: &str, record: &'a Map<String, Value>) -> RemoteResult<&'a Value> {
    match record.get("id") {
        Some(id) if !id.is_null() => Ok(id),
        _ => Err(RemoteError::MissingId {
            table: table.to_string(),
        }),
    }
}
