use std::time::Duration;

use fulcrum_core::error::SyncError;
use fulcrum_core::target::{PageEnvelope, SyncTarget};
use fulcrum_core::traits::PageFetcher;
use reqwest::{Client, Method, StatusCode};
use url::Url;

/// Where and how to reach the API.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// Sent as the Basic auth username with an empty password.
    pub api_token: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Result<Self, SyncError> {
        if api_token.trim().is_empty() {
            return Err(SyncError::ConfigError(
                "no API token given (set FULCRUM_API_TOKEN or pass --token)".into(),
            ));
        }
        let base_url = Url::parse(base_url)
            .map_err(|e| SyncError::ConfigError(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::ConfigError(format!(
                "base URL '{base_url}' cannot take a path"
            )));
        }
        Ok(Self {
            base_url,
            api_token: api_token.to_string(),
            timeout,
        })
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Page fetcher backed by reqwest.
///
/// Builds the request URL from the target's path, filters and cursor, sends
/// it with Basic auth and classifies the response. On success the target's
/// cursor is advanced from the envelope.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
    config: ClientConfig,
}

impl HttpPageFetcher {
    pub fn new(config: ClientConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .user_agent(concat!("Fulcrum/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::TransportError(e.to_string()))?;

        Ok(Self { client, config })
    }
}

impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, target: &mut SyncTarget) -> Result<PageEnvelope, SyncError> {
        let url = target.url(&self.config.base_url)?;
        let method = Method::from_bytes(target.endpoint.method.as_bytes()).map_err(|_| {
            SyncError::ConfigError(format!(
                "endpoint '{}' has invalid method '{}'",
                target.endpoint.name, target.endpoint.method
            ))
        })?;

        tracing::debug!(%method, %url, "Fetching page");

        let response = self
            .client
            .request(method, url.clone())
            .basic_auth(&self.config.api_token, None::<&str>)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SyncError::TransportError(format!(
                        "request to {url} timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    SyncError::TransportError(format!("connection failed for {url}: {e}"))
                } else {
                    SyncError::TransportError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), %url, "Unexpected status");
            return Err(SyncError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            SyncError::TransportError(format!("failed to read response body from {url}: {e}"))
        })?;

        let page = PageEnvelope::parse(&body)?;
        target.advance(&page);
        Ok(page)
    }
}
