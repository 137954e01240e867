//! Upstream node access and multi-endpoint selection.
//!
//! This module handles communication with the configured JSON-RPC endpoints:
//! - HTTP client with connection pooling and concurrency control
//! - The [`RpcTransport`] capability every endpoint provides
//! - Fan-out of one logical request to all endpoints with ordered selection
//! - Consensus over reported chain heights with a monotonic ratchet
//!
//! # Selection Strategy
//!
//! Every read is sent to all endpoints. Which answer wins depends on the call:
//!
//! ```text
//! Request → [Height query?]
//!              │
//!              ├─ Yes → HeightConsensus (median window + ratchet)
//!              │
//!              └─ No → [List result (logs)?]
//!                        │
//!                        ├─ Yes → FanOutExecutor::longest (most entries, earliest on tie)
//!                        │
//!                        └─ No → FanOutExecutor::first_valid (configured order)
//! ```

pub mod consensus;
pub mod endpoint;
pub mod errors;
pub mod fanout;
pub mod http_client;
pub mod transport;

pub use consensus::HeightConsensus;
pub use endpoint::{EndpointConfig, UpstreamEndpoint};
pub use errors::{RpcErrorCategory, UpstreamError};
pub use fanout::{
    EndpointOutcome, FailurePolicy, FanOutExecutor, FanOutTimeouts, RequestClass, RequestOutcome,
    Validator,
};
pub use http_client::{HttpClient, HttpClientConfig};
pub use transport::RpcTransport;
