//! Page transport
//!
//! The pager only needs "GET this URL, give me status and body". That seam is
//! the [`PageTransport`] trait; [`HttpTransport`] is the reqwest-backed
//! production implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::error::{FetchError, FetchResult};

/// Raw response of a page request
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can GET a page
#[async_trait]
pub trait PageTransport: Send + Sync {
    /// Issue a GET and return the full response
    async fn get(&self, url: &str) -> FetchResult<PageResponse>;
}

/// HTTP client settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Per-request timeout
    pub request_timeout: Duration,
    /// User-Agent header
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            user_agent: format!("stacdash/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &HttpTransportConfig) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageTransport for HttpTransport {
    async fn get(&self, url: &str) -> FetchResult<PageResponse> {
        let request_failed = |e: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            reason: if e.is_timeout() {
                "timed out".to_string()
            } else {
                e.to_string()
            },
        };

        let response = self
            .client
            .get(url)
            .header("Accept", "application/geo+json, application/json")
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(request_failed)?;

        Ok(PageResponse { status, body })
    }
}
