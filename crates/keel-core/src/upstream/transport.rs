//! The capability every endpoint client provides.

use async_trait::async_trait;
use serde_json::Value;

use super::errors::UpstreamError;

/// One remote node that answers JSON-RPC calls.
///
/// The fan-out executor and the providers only depend on this trait, so the
/// HTTP client can be swapped for an in-process fake in tests.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Stable, human-readable endpoint name used in logs.
    fn name(&self) -> &str;

    /// Sends one request and returns the `result` member.
    ///
    /// A `null` or missing result is returned as [`Value::Null`]; interpreting it
    /// is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport failures and JSON-RPC error objects.
    async fn request(&self, method: &str, params: Value) -> Result<Value, UpstreamError>;
}
