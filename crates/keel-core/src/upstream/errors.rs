use thiserror::Error;

/// Classification of JSON-RPC errors returned by a node.
///
/// - Client errors are the caller's fault and will fail on every endpoint
/// - Provider errors and rate limits are worth retrying elsewhere or later
/// - Execution errors (reverts) are a property of the call, not of the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcErrorCategory {
    /// Invalid request, method not found, invalid params.
    ClientError,
    /// Internal error or a server error that is not an execution failure.
    ProviderError,
    /// Rate limiting at JSON-RPC level (-32005), which is also how most public
    /// nodes report an oversized `eth_getLogs` range.
    RateLimit,
    /// Malformed request body reported by the node (-32700).
    ParseError,
    /// Reverts, out of gas and similar call failures.
    ExecutionError,
}

impl RpcErrorCategory {
    /// Classifies a JSON-RPC error code and message into a category.
    ///
    /// For the -32000 to -32099 range the message is inspected to tell
    /// execution errors apart from provider errors.
    #[must_use]
    pub fn from_code_and_message(code: i32, message: &str) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32602..=-32600 => Self::ClientError,
            -32603 => Self::ProviderError,
            -32005 => Self::RateLimit,
            -32099..=-32000 => {
                let message_lower = message.to_lowercase();
                if message_lower.contains("execution reverted") ||
                    message_lower.contains("revert") ||
                    message_lower.contains("out of gas") ||
                    message_lower.contains("insufficient funds")
                {
                    Self::ExecutionError
                } else {
                    Self::ProviderError
                }
            }
            _ => Self::ProviderError,
        }
    }

    /// Returns `true` if this error category can succeed on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimit | Self::ProviderError)
    }

    /// Returns a static string representation for log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientError => "client_error",
            Self::ProviderError => "provider_error",
            Self::RateLimit => "rate_limit",
            Self::ParseError => "parse_error",
            Self::ExecutionError => "execution_error",
        }
    }
}

/// Errors that can occur when querying endpoints.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UpstreamError {
    /// Request exceeded the timeout of its request class.
    #[error("Request timeout")]
    Timeout,

    /// Failed to establish a connection to the endpoint.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Non-2xx HTTP status. First field is the status code.
    #[error("HTTP error {0}: {1}")]
    HttpError(u16, String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {0}: {1}")]
    RpcError(i32, String),

    /// Network-level error from the underlying HTTP client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response could not be parsed into the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be built or serialized.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Response parsed but was rejected by the call's validator.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// No endpoint produced a validated result for the call.
    #[error("All nodes failed for {method} ({endpoints} endpoints queried)")]
    AllNodesFailed { method: String, endpoints: usize },

    /// A transaction did not reach the requested confirmation depth in time.
    #[error("Timed out waiting for {confirmations} confirmations of {hash}")]
    ConfirmationTimeout { hash: String, confirmations: u64 },
}

impl UpstreamError {
    /// Returns the RPC error category if this is an RPC error.
    #[must_use]
    pub fn rpc_category(&self) -> Option<RpcErrorCategory> {
        match self {
            Self::RpcError(code, message) => {
                Some(RpcErrorCategory::from_code_and_message(*code, message))
            }
            _ => None,
        }
    }

    /// Returns `true` if the same request may succeed on a later attempt.
    ///
    /// Timeouts, network failures, 5xx/429 responses, rate limits, validation
    /// failures (a node that has not caught up yet) and aggregate failures are
    /// transient. Malformed requests, client RPC errors and reverts are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout |
            Self::Network(_) |
            Self::ConnectionFailed(_) |
            Self::ValidationFailed(_) |
            Self::AllNodesFailed { .. } |
            Self::ConfirmationTimeout { .. } => true,
            Self::HttpError(status, _) => (500..=599).contains(status) || *status == 429,
            Self::RpcError(_, _) => self.rpc_category().is_some_and(|cat| cat.is_transient()),
            Self::InvalidResponse(_) | Self::InvalidRequest(_) => false,
        }
    }

    /// Short label for structured log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::HttpError(_, _) => "http_error",
            Self::RpcError(_, _) => self.rpc_category().map_or("rpc_error", |c| c.as_str()),
            Self::Network(_) => "network",
            Self::InvalidResponse(_) => "invalid_response",
            Self::InvalidRequest(_) => "invalid_request",
            Self::ValidationFailed(_) => "validation_failed",
            Self::AllNodesFailed { .. } => "all_nodes_failed",
            Self::ConfirmationTimeout { .. } => "confirmation_timeout",
        }
    }
}
