use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

use super::error::QuotaError;
use super::types::QuotaUsageApiResponse;

/// Path of the quota usage endpoint, relative to the API base URL
const QUOTA_USAGE_PATH: &str = "/users/me/quota_usage/me";

/// Client timeout for a single quota request
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Performs a single quota read for a bearer token
///
/// Implementations must not retry and must not touch shared state.
#[async_trait]
pub trait QuotaFetcher: Send + Sync {
    async fn fetch(&self, token: &str, timeout: Duration) -> Result<QuotaUsageApiResponse, QuotaError>;
}

/// Quota fetcher backed by the remote HTTP API
pub struct HttpQuotaFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuotaFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Full URL of the quota usage endpoint
    pub fn endpoint(&self) -> String {
        format!("{}{QUOTA_USAGE_PATH}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl QuotaFetcher for HttpQuotaFetcher {
    async fn fetch(&self, token: &str, timeout: Duration) -> Result<QuotaUsageApiResponse, QuotaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| QuotaError::RequestSetup(format!("Invalid token format: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let url = self.endpoint();
        log::debug!("Fetching quota usage from {url}");

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Quota API returned {status}");
            return Err(QuotaError::from_status(status.as_u16(), status.canonical_reason()));
        }

        let api_response: QuotaUsageApiResponse = response.json().await?;
        log::trace!("Quota API response: {api_response:?}");

        Ok(api_response)
    }
}
