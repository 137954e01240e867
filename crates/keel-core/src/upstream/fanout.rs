//! Ordered fan-out across every configured endpoint.
//!
//! A logical request is sent to all endpoints at once, each call raced against
//! the timeout of its [`RequestClass`]. Selection only starts once every call
//! has settled, and it scans outcomes in configured endpoint order, so an
//! earlier endpoint wins whenever it eventually answers with a valid result,
//! even if a later one answered first.
//!
//! ```text
//! request ──┬──► endpoint[0] ──timeout──► outcome[0] ─┐
//!           ├──► endpoint[1] ──timeout──► outcome[1] ─┼─► select (configured order)
//!           └──► endpoint[2] ──timeout──► outcome[2] ─┘
//! ```

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{future::Future, sync::Arc, time::Duration};
use tracing::{debug, warn};

use super::{errors::UpstreamError, transport::RpcTransport};

/// Timeout class of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// `eth_blockNumber`: answered from memory by healthy nodes.
    Height,
    /// Block, transaction, receipt, balance and call queries.
    Standard,
    /// `eth_getLogs`: range scans can be slow on any node.
    Logs,
}

/// How a list-returning fan-out treats endpoints that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Failed endpoints are excluded; if all fail the call fails.
    FailFast,
    /// Failed endpoints contribute an empty list; the call never fails.
    #[default]
    DegradeToEmpty,
}

/// Per-class timeouts.
#[derive(Debug, Clone, Copy)]
pub struct FanOutTimeouts {
    pub height: Duration,
    pub standard: Duration,
    pub logs_multiplier: u32,
}

impl Default for FanOutTimeouts {
    fn default() -> Self {
        Self {
            height: Duration::from_millis(500),
            standard: Duration::from_millis(3000),
            logs_multiplier: 3,
        }
    }
}

impl FanOutTimeouts {
    #[must_use]
    pub fn for_class(&self, class: RequestClass) -> Duration {
        match class {
            RequestClass::Height => self.height,
            RequestClass::Standard => self.standard,
            RequestClass::Logs => self.standard.saturating_mul(self.logs_multiplier.max(1)),
        }
    }
}

/// Result of one endpoint invocation.
#[derive(Debug)]
pub enum RequestOutcome<T> {
    Success(T),
    Failed(UpstreamError),
}

impl<T> RequestOutcome<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failed(_) => None,
        }
    }
}

/// Outcome tagged with the endpoint that produced it.
#[derive(Debug)]
pub struct EndpointOutcome<T> {
    pub endpoint: Arc<str>,
    pub outcome: RequestOutcome<T>,
}

/// Accepts or rejects a successfully parsed result.
pub type Validator<T> = fn(&T) -> bool;

/// Sends one logical request to every endpoint and selects a result.
pub struct FanOutExecutor {
    endpoints: Vec<Arc<dyn RpcTransport>>,
    timeouts: FanOutTimeouts,
}

impl FanOutExecutor {
    /// Creates an executor over a fixed, ordered endpoint set.
    #[must_use]
    pub fn new(endpoints: Vec<Arc<dyn RpcTransport>>, timeouts: FanOutTimeouts) -> Self {
        Self { endpoints, timeouts }
    }

    #[must_use]
    pub fn endpoints(&self) -> &[Arc<dyn RpcTransport>] {
        &self.endpoints
    }

    #[must_use]
    pub fn timeouts(&self) -> &FanOutTimeouts {
        &self.timeouts
    }

    /// Runs `op` against every endpoint concurrently and returns all outcomes in
    /// configured endpoint order.
    ///
    /// Errors, timeouts and validator rejections become
    /// [`RequestOutcome::Failed`]; they never interrupt the other calls.
    pub async fn collect<T, F, Fut>(
        &self,
        method: &str,
        class: RequestClass,
        op: F,
        validator: Option<Validator<T>>,
    ) -> Vec<EndpointOutcome<T>>
    where
        F: Fn(Arc<dyn RpcTransport>) -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let timeout = self.timeouts.for_class(class);

        let calls = self.endpoints.iter().map(|endpoint| {
            let name: Arc<str> = Arc::from(endpoint.name());
            let call = op(Arc::clone(endpoint));
            async move {
                let outcome = match tokio::time::timeout(timeout, call).await {
                    Ok(Ok(value)) => match validator {
                        Some(is_valid) if !is_valid(&value) => RequestOutcome::Failed(
                            UpstreamError::ValidationFailed(format!("{method} result rejected")),
                        ),
                        _ => RequestOutcome::Success(value),
                    },
                    Ok(Err(e)) => RequestOutcome::Failed(e),
                    Err(_) => RequestOutcome::Failed(UpstreamError::Timeout),
                };

                if let RequestOutcome::Failed(e) = &outcome {
                    warn!(
                        upstream = %name,
                        method = %method,
                        error = %e,
                        error_kind = e.kind(),
                        "endpoint request failed"
                    );
                }

                EndpointOutcome { endpoint: name, outcome }
            }
        });

        join_all(calls).await
    }

    /// Returns the first validated success in configured endpoint order.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::AllNodesFailed`] if no endpoint validated.
    pub async fn first_valid<T, F, Fut>(
        &self,
        method: &str,
        class: RequestClass,
        op: F,
        validator: Option<Validator<T>>,
    ) -> Result<T, UpstreamError>
    where
        F: Fn(Arc<dyn RpcTransport>) -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let outcomes = self.collect(method, class, op, validator).await;
        let endpoints = outcomes.len();

        outcomes
            .into_iter()
            .find_map(|EndpointOutcome { endpoint, outcome }| {
                outcome.success().inspect(|_| {
                    debug!(upstream = %endpoint, method = %method, "selected endpoint result");
                })
            })
            .ok_or_else(|| UpstreamError::AllNodesFailed { method: method.to_string(), endpoints })
    }

    /// Returns the longest list among all endpoints' results.
    ///
    /// Ties go to the earliest-configured endpoint. Failed endpoints are handled
    /// according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::AllNodesFailed`] only under
    /// [`FailurePolicy::FailFast`] when every endpoint failed.
    pub async fn longest<T, F, Fut>(
        &self,
        method: &str,
        class: RequestClass,
        op: F,
        policy: FailurePolicy,
    ) -> Result<Vec<T>, UpstreamError>
    where
        F: Fn(Arc<dyn RpcTransport>) -> Fut,
        Fut: Future<Output = Result<Vec<T>, UpstreamError>>,
    {
        let outcomes = self.collect(method, class, op, None).await;
        let endpoints = outcomes.len();

        let mut best: Option<(Arc<str>, Vec<T>)> = None;
        for EndpointOutcome { endpoint, outcome } in outcomes {
            let candidate = match (outcome, policy) {
                (RequestOutcome::Success(items), _) => items,
                (RequestOutcome::Failed(_), FailurePolicy::DegradeToEmpty) => Vec::new(),
                (RequestOutcome::Failed(_), FailurePolicy::FailFast) => continue,
            };
            if best.as_ref().map_or(true, |(_, current)| candidate.len() > current.len()) {
                best = Some((endpoint, candidate));
            }
        }

        match best {
            Some((endpoint, items)) => {
                debug!(
                    upstream = %endpoint,
                    method = %method,
                    count = items.len(),
                    "selected longest endpoint result"
                );
                Ok(items)
            }
            None => Err(UpstreamError::AllNodesFailed { method: method.to_string(), endpoints }),
        }
    }

    /// Fan-out of a raw JSON-RPC call, parsed per endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::AllNodesFailed`] if no endpoint validated.
    pub async fn request<T>(
        &self,
        method: &str,
        params: Value,
        class: RequestClass,
        parse: fn(Value) -> Result<T, UpstreamError>,
        validator: Option<Validator<T>>,
    ) -> Result<T, UpstreamError> {
        let op = |endpoint: Arc<dyn RpcTransport>| {
            let params = params.clone();
            async move { endpoint.request(method, params).await.and_then(parse) }
        };
        self.first_valid(method, class, op, validator).await
    }
}
