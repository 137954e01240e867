//! Builder for constructing a [`ResilientProvider`] from configuration.

use std::{sync::Arc, time::Duration};
use thiserror::Error;

use super::resilient::ResilientProvider;
use crate::{
    config::{AppConfig, RpcConfig},
    upstream::{
        EndpointConfig, FanOutExecutor, HttpClient, HttpClientConfig, RpcTransport,
        UpstreamEndpoint,
    },
};

/// Errors that can occur during provider construction.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// HTTP client initialization failed
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(String),

    /// At least one endpoint is required
    #[error("At least one endpoint is required")]
    NoEndpoints,
}

/// An endpoint waiting to be built, kept in insertion order.
enum PendingEndpoint {
    Http(EndpointConfig),
    Transport(Arc<dyn RpcTransport>),
}

/// Builder for constructing a [`ResilientProvider`].
///
/// Endpoints keep the order in which they were added; that order is the
/// selection priority.
///
/// # Examples
///
/// ```no_run
/// # use keel_core::{provider::{ChainProvider, ResilientProviderBuilder}, upstream::EndpointConfig};
/// # use std::{sync::Arc, time::Duration};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ResilientProviderBuilder::new()
///     .endpoint(EndpointConfig {
///         name: Arc::from("primary"),
///         url: "https://rpc.example.com".to_string(),
///         timeout: Duration::from_secs(30),
///     })
///     .concurrency_limit(64)
///     .build()?;
///
/// let height = provider.block_number().await?;
/// # Ok(())
/// # }
/// ```
pub struct ResilientProviderBuilder {
    endpoints: Vec<PendingEndpoint>,
    rpc: RpcConfig,
    http: HttpClientConfig,
}

impl ResilientProviderBuilder {
    /// Creates a new builder with default settings and no endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self { endpoints: Vec::new(), rpc: RpcConfig::default(), http: HttpClientConfig::default() }
    }

    /// Creates a builder with the endpoints and RPC settings of `config`.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        config
            .upstreams
            .providers
            .iter()
            .fold(Self::new(), |builder, provider| builder.endpoint(provider.endpoint_config()))
            .rpc_config(config.rpc.clone())
            .concurrency_limit(config.upstreams.concurrent_limit)
    }

    /// Adds an HTTP endpoint.
    #[must_use]
    pub fn endpoint(mut self, config: EndpointConfig) -> Self {
        self.endpoints.push(PendingEndpoint::Http(config));
        self
    }

    /// Adds a pre-built transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.endpoints.push(PendingEndpoint::Transport(transport));
        self
    }

    #[must_use]
    pub fn rpc_config(mut self, config: RpcConfig) -> Self {
        self.rpc = config;
        self
    }

    /// Sets HTTP client concurrency limit (default: 256).
    #[must_use]
    pub fn concurrency_limit(mut self, limit: usize) -> Self {
        self.http.concurrent_limit = limit;
        self
    }

    /// Builds the provider.
    ///
    /// The HTTP client is only created when at least one HTTP endpoint was added,
    /// and is shared by all of them.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::NoEndpoints`] if no endpoint was added, or
    /// [`BuilderError::HttpClientInit`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<ResilientProvider, BuilderError> {
        if self.endpoints.is_empty() {
            return Err(BuilderError::NoEndpoints);
        }

        let mut http_client: Option<Arc<HttpClient>> = None;
        let mut endpoints: Vec<Arc<dyn RpcTransport>> = Vec::with_capacity(self.endpoints.len());

        for pending in self.endpoints {
            let transport: Arc<dyn RpcTransport> = match pending {
                PendingEndpoint::Transport(transport) => transport,
                PendingEndpoint::Http(config) => {
                    let client = match &http_client {
                        Some(client) => Arc::clone(client),
                        None => {
                            let client = Arc::new(
                                HttpClient::with_config(self.http.clone())
                                    .map_err(|e| BuilderError::HttpClientInit(e.to_string()))?,
                            );
                            http_client = Some(Arc::clone(&client));
                            client
                        }
                    };
                    Arc::new(UpstreamEndpoint::new(config, client))
                }
            };
            endpoints.push(transport);
        }

        tracing::info!(
            endpoints = endpoints.len(),
            consensus_window = self.rpc.consensus_window,
            "resilient provider ready"
        );

        Ok(ResilientProvider::new(
            FanOutExecutor::new(endpoints, self.rpc.fan_out_timeouts()),
            self.rpc.consensus_window,
            self.rpc.multicall_address,
            Duration::from_millis(self.rpc.receipt_poll_interval_ms),
            self.rpc.logs_failure_policy,
        ))
    }
}

impl Default for ResilientProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
