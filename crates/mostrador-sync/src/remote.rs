//! # Remote API Client
//!
//! The seam between the coordinator and the network.
//!
//! [`RemoteApi`] is the object-safe trait the coordinator drives; tests swap
//! in an in-process fake, production uses [`HttpRemote`] over `reqwest`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{ProductRecord, SalePushRequest, SalePushResponse, StockRecord};

/// Remote Sales/Catalog API operations.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Pushes one finalized sale. Idempotent on `localSaleId`.
    async fn push_sale(&self, request: &SalePushRequest) -> SyncResult<SalePushResponse>;

    /// Fetches products changed since the cursor, up to `limit` rows.
    /// `None` means a full fetch (first pull on a fresh device).
    async fn fetch_products(
        &self,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> SyncResult<Vec<ProductRecord>>;

    /// Fetches stock rows changed since the cursor, up to `limit` rows.
    async fn fetch_stock(
        &self,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> SyncResult<Vec<StockRecord>>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// `reqwest`-backed [`RemoteApi`].
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRemote {
    /// Builds an HTTP remote from the sync configuration.
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(HttpRemote {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Maps a non-success response to [`SyncError::Remote`], reading the body
    /// as the message.
    async fn check(response: reqwest::Response) -> SyncResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.as_str().to_string());
        Err(SyncError::remote(status.as_u16(), message))
    }

    fn pull_query(since: Option<DateTime<Utc>>, limit: u32) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339()));
        }
        query
    }
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn push_sale(&self, request: &SalePushRequest) -> SyncResult<SalePushResponse> {
        debug!(local_sale_id = %request.local_sale_id, "Pushing sale");

        let response = self
            .request(self.client.post(format!("{}/sales", self.base_url)))
            .json(request)
            .send()
            .await?;

        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn fetch_products(
        &self,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> SyncResult<Vec<ProductRecord>> {
        let response = self
            .request(self.client.get(format!("{}/products", self.base_url)))
            .query(&Self::pull_query(since, limit))
            .send()
            .await?;

        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn fetch_stock(
        &self,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> SyncResult<Vec<StockRecord>> {
        let response = self
            .request(self.client.get(format!("{}/stock", self.base_url)))
            .query(&Self::pull_query(since, limit))
            .send()
            .await?;

        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let remote = HttpRemote::new(&SyncConfig::new("https://api.example.com/")).unwrap();
        assert_eq!(remote.base_url, "https://api.example.com");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(HttpRemote::new(&SyncConfig::new("not-a-url")).is_err());
    }

    #[test]
    fn test_pull_query_omits_since_on_first_pull() {
        let query = HttpRemote::pull_query(None, 500);
        assert_eq!(query, vec![("limit", "500".to_string())]);

        let since = Utc::now();
        let query = HttpRemote::pull_query(Some(since), 500);
        assert_eq!(query.len(), 2);
        assert_eq!(query[1].0, "since");
    }
}
