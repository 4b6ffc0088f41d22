//! Transport seam of the marketplace client
//!
//! The retry and envelope-classification logic is written against
//! [`MarketTransport`] so it can be exercised without a network; the
//! production implementation is a thin `reqwest` wrapper.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;

use shared::error::AppError;
use shared::AppResult;

/// Raw outcome of one marketplace call
///
/// The marketplace returns business failures inside HTTP 200 envelopes,
/// so status and body travel together and classification happens upstream.
#[derive(Debug, Clone)]
pub struct MarketResponse {
    pub status: u16,
    pub body: Value,
}

/// One HTTP exchange with the marketplace order service
#[async_trait]
pub trait MarketTransport: Send + Sync {
    async fn send(&self, method: Method, path: &str, body: &Value) -> AppResult<MarketResponse>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MarketTransport for HttpTransport {
    async fn send(&self, method: Method, path: &str, body: &Value) -> AppResult<MarketResponse> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        // The order service expects a JSON body even on GET requests.
        let response = self
            .client
            .request(method, &url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| AppError::network(format!("unreadable response body: {e}")))?;

        Ok(MarketResponse { status, body })
    }
}
