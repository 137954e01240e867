use reqwest::{Client, ClientBuilder};
use std::{sync::Arc, time::Duration};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::upstream::UpstreamError;

/// Longest error body kept in [`UpstreamError::HttpError`].
const ERROR_BODY_LIMIT: usize = 256;

/// Short reason for a failed exchange, `None` for timeouts. Never includes the
/// URL, which may carry an API key.
fn describe_network_error(error: &reqwest::Error) -> Option<&'static str> {
    if error.is_timeout() {
        None
    } else if error.is_connect() {
        Some("connection refused or unreachable")
    } else if error.is_body() || error.is_decode() {
        Some("malformed response body")
    } else {
        Some("request failed")
    }
}

fn truncate_body(mut text: String, limit: usize) -> String {
    if text.len() <= limit {
        return text;
    }
    let mut cut = limit;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str("... (truncated)");
    text
}

/// Configuration for the shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum number of concurrent HTTP requests across all endpoints
    pub concurrent_limit: usize,
    /// Permit acquisition timeout in milliseconds
    pub permit_timeout_ms: u64,
    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self { concurrent_limit: 256, permit_timeout_ms: 500, connect_timeout_ms: 5000 }
    }
}

/// HTTP client with semaphore-based concurrency control.
///
/// One instance is shared by every endpoint so that a burst of fan-out calls
/// cannot open an unbounded number of sockets.
pub struct HttpClient {
    client: Client,
    permits: Arc<Semaphore>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Creates a new HTTP client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, UpstreamError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Creates a new HTTP client with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn with_config(config: HttpClientConfig) -> Result<Self, UpstreamError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(32)
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("keel/", env!("CARGO_PKG_VERSION")))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                UpstreamError::ConnectionFailed(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.concurrent_limit)),
            config,
        })
    }

    /// Sends an HTTP POST with a JSON body.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Timeout`] if permit acquisition or the request times out
    /// - [`UpstreamError::HttpError`] for non-success HTTP status codes
    /// - [`UpstreamError::ConnectionFailed`] for network-related failures
    pub async fn send_request(
        &self,
        url: &str,
        body: bytes::Bytes,
        timeout: Duration,
    ) -> Result<bytes::Bytes, UpstreamError> {
        let _permit = self.acquire_permit().await?;

        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .body(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| match describe_network_error(&e) {
                None => UpstreamError::Timeout,
                Some(reason) => UpstreamError::ConnectionFailed(reason.to_string()),
            })?;

        let status = response.status();
        if status.is_success() {
            return response.bytes().await.map_err(UpstreamError::Network);
        }

        let text = response.text().await.unwrap_or_default();
        tracing::trace!(status = status.as_u16(), "http request failed");
        Err(UpstreamError::HttpError(status.as_u16(), truncate_body(text, ERROR_BODY_LIMIT)))
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit, UpstreamError> {
        let wait = Duration::from_millis(self.config.permit_timeout_ms);
        match tokio::time::timeout(wait, Arc::clone(&self.permits).acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(UpstreamError::ConnectionFailed("http client closed".to_string())),
            Err(_) => {
                tracing::warn!(
                    available_permits = self.permits.available_permits(),
                    "http client saturated, request dropped"
                );
                Err(UpstreamError::Timeout)
            }
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}
