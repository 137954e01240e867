use async_trait::async_trait;
use serde_json::Value;
use std::{sync::Arc, time::Duration};

use crate::{
    types::{JsonRpcRequest, JsonRpcResponse},
    upstream::{errors::UpstreamError, http_client::HttpClient, transport::RpcTransport},
};

/// Connection settings for one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub name: Arc<str>,
    pub url: String,
    /// Hard ceiling for one HTTP exchange. The fan-out executor races calls
    /// against shorter class timeouts; this only bounds abandoned requests.
    pub timeout: Duration,
}

/// A single JSON-RPC node reached over HTTP.
///
/// Encodes the request envelope, posts it through the shared [`HttpClient`] and
/// unwraps the response envelope. It keeps no health state: endpoint selection
/// is the fan-out executor's job.
pub struct UpstreamEndpoint {
    config: EndpointConfig,
    http_client: Arc<HttpClient>,
}

impl UpstreamEndpoint {
    #[must_use]
    pub fn new(config: EndpointConfig, http_client: Arc<HttpClient>) -> Self {
        Self { config, http_client }
    }

    /// Returns a reference to the endpoint configuration.
    #[must_use]
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Sends a JSON-RPC request and returns the decoded response envelope.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamError::InvalidRequest` if request serialization fails.
    /// Returns `UpstreamError::InvalidResponse` if response parsing fails.
    /// Returns `UpstreamError::RpcError` if the response carries an error object.
    pub async fn send_request(
        &self,
        request: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, UpstreamError> {
        tracing::trace!(
            upstream = %self.config.name,
            method = %request.method,
            "sending request to upstream"
        );

        let body = serde_json::to_vec(request).map_err(|e| {
            UpstreamError::InvalidRequest(format!("Failed to serialize request: {e}"))
        })?;

        let start_time = std::time::Instant::now();
        let response_bytes = self
            .http_client
            .send_request(&self.config.url, bytes::Bytes::from(body), self.config.timeout)
            .await?;

        let response: JsonRpcResponse = serde_json::from_slice(&response_bytes)
            .map_err(|e| UpstreamError::InvalidResponse(format!("Invalid JSON: {e}")))?;

        if let Some(error) = &response.error {
            return Err(UpstreamError::RpcError(error.code, error.message.clone()));
        }

        tracing::trace!(
            upstream = %self.config.name,
            method = %request.method,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "upstream responded"
        );
        Ok(response)
    }
}

#[async_trait]
impl RpcTransport for UpstreamEndpoint {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, UpstreamError> {
        let request = JsonRpcRequest::with_next_id(method, params);
        let response = self.send_request(&request).await?;
        Ok(response.result.unwrap_or(Value::Null))
    }
}
