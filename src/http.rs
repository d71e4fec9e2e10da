//! HTTP client used by the crawler and the exporter
//!
//! Page and JSON fetches are single attempts: failures bubble up to the
//! caller, which decides whether a lane or scan stops. Only image downloads
//! are retried, a fixed number of times and without backoff.

use reqwest::{Client as ReqwestClient, Response};
use scraper::Html;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::crawler::{CrawlError, CrawlerConfig};

/// Thin wrapper around a shared reqwest client
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: ReqwestClient,
}

impl FetchClient {
    /// Create a client from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let mut builder = ReqwestClient::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// GET a page and parse it as an HTML document
    pub async fn fetch_document(&self, url: &str) -> Result<Html, CrawlError> {
        let body = self.fetch_text(url).await?;
        Ok(Html::parse_document(&body))
    }

    /// GET a page body as text
    pub async fn fetch_text(&self, url: &str) -> Result<String, CrawlError> {
        debug!("GET {}", url);
        let response = self.send(url).await?;
        Ok(response.text().await?)
    }

    /// GET a JSON endpoint
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CrawlError> {
        let body = self.fetch_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET binary content, trying up to `attempts` times
    pub async fn fetch_bytes(&self, url: &str, attempts: u32) -> Result<Vec<u8>, CrawlError> {
        let mut last_error = CrawlError::Other(format!("no attempt made for {url}"));
        for attempt in 0..attempts {
            match self.send(url).await {
                Ok(response) => match response.bytes().await {
                    Ok(bytes) => return Ok(bytes.to_vec()),
                    Err(e) => last_error = e.into(),
                },
                Err(e) => last_error = e,
            }
            warn!("Connect to {} failed: {} Retry: {}", url, last_error, attempt);
        }
        Err(last_error)
    }

    async fn send(&self, url: &str) -> Result<Response, CrawlError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}
