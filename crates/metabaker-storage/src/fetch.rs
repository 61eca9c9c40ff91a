//! HTTP asset fetcher
//!
//! `ipfs://<cid>/<path>` URIs are fetched through an HTTP gateway as
//! `<gateway>/ipfs/<cid>/<path>`; other URIs are fetched as given.

use metabaker_core::{AssetFetcher, MetabakerError, Result};
use serde_json::Value;
use std::time::Duration;

/// Rewrite an `ipfs://` URI through a gateway
#[must_use]
pub fn gateway_url(gateway: &str, uri: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(rest) => {
            let rest = rest.strip_prefix("ipfs/").unwrap_or(rest);
            format!("{}/ipfs/{}", gateway.trim_end_matches('/'), rest)
        }
        None => uri.to_string(),
    }
}

/// [`AssetFetcher`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    gateway: String,
}

impl HttpFetcher {
    /// Create fetcher using `gateway` for IPFS URIs
    ///
    /// # Errors
    /// - `MetabakerError::Config` if the HTTP client cannot be built
    pub fn new(gateway: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MetabakerError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            gateway: gateway.into(),
        })
    }

    async fn get(&self, uri: &str) -> Result<reqwest::Response> {
        let url = gateway_url(&self.gateway, uri);
        tracing::debug!("GET {}", url);
        self.client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| MetabakerError::external(format!("GET {url}: {e}")))
    }
}

#[async_trait::async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch_json(&self, uri: &str) -> Result<Value> {
        self.get(uri)
            .await?
            .json()
            .await
            .map_err(|e| MetabakerError::external(format!("GET {uri}: invalid json: {e}")))
    }

    async fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let bytes = self
            .get(uri)
            .await?
            .bytes()
            .await
            .map_err(|e| MetabakerError::external(format!("GET {uri}: {e}")))?;
        Ok(bytes.to_vec())
    }
}
