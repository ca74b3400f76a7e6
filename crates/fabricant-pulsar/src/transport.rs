//! Risk gateway transports
//!
//! The oracle client only needs two calls from the outside world: a single
//! lookup and a batch lookup. Anything that can answer them (HTTP gateway,
//! micropayment-gated API, in-memory fixture) plugs in behind [`RiskTransport`].

use crate::error::OracleError;
use crate::types::RiskMetrics;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Header carrying the gateway API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// External risk data source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RiskTransport: Send + Sync {
    /// Fetch metrics for one asset
    async fn fetch(&self, asset: &str) -> Result<RiskMetrics, OracleError>;

    /// Fetch metrics for several assets in one round-trip.
    ///
    /// The returned map may omit assets the gateway knows nothing about.
    async fn fetch_batch(
        &self,
        assets: &[String],
    ) -> Result<HashMap<String, RiskMetrics>, OracleError>;
}

/// Transport used when no gateway is configured: knows nothing about anything
#[derive(Clone, Debug, Default)]
pub struct PlaceholderTransport;

#[async_trait]
impl RiskTransport for PlaceholderTransport {
    async fn fetch(&self, asset: &str) -> Result<RiskMetrics, OracleError> {
        Ok(RiskMetrics::unknown(asset))
    }

    async fn fetch_batch(
        &self,
        assets: &[String],
    ) -> Result<HashMap<String, RiskMetrics>, OracleError> {
        Ok(assets
            .iter()
            .map(|asset| (asset.clone(), RiskMetrics::unknown(asset.as_str())))
            .collect())
    }
}

/// JSON-over-HTTP risk gateway
pub struct HttpRiskTransport {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    assets: &'a [String],
}

#[derive(Deserialize)]
struct BatchResponse {
    #[serde(default)]
    results: Vec<RiskMetrics>,
}

impl HttpRiskTransport {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Endpoint URL with `segments` appended. Each segment is percent-encoded,
    /// so an asset id cannot add path components or a query string.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, OracleError> {
        let invalid =
            |reason: String| OracleError::InvalidEndpoint(format!("{}: {}", self.endpoint, reason));
        let mut url = Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("not a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn asset_url(&self, asset: &str) -> Result<Url, OracleError> {
        self.url(["v1", "risk", asset])
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }
}

#[async_trait]
impl RiskTransport for HttpRiskTransport {
    async fn fetch(&self, asset: &str) -> Result<RiskMetrics, OracleError> {
        let request = self.client.get(self.asset_url(asset)?);

        let metrics: RiskMetrics = self
            .authorize(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(metrics)
    }

    async fn fetch_batch(
        &self,
        assets: &[String],
    ) -> Result<HashMap<String, RiskMetrics>, OracleError> {
        let request = self
            .client
            .post(self.url(["v1", "risk", "batch"])?)
            .json(&BatchRequest { assets });

        let response: BatchResponse = self
            .authorize(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .results
            .into_iter()
            .map(|metrics| (metrics.asset.clone(), metrics))
            .collect())
    }
}
