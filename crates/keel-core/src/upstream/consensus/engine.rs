//! Trusted chain height with a monotonic ratchet.
//!
//! The selection rule itself is implemented in [`super::quorum`].

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde_json::json;
use tracing::{debug, info};

use super::quorum;
use crate::{
    upstream::{
        errors::UpstreamError,
        fanout::{FanOutExecutor, RequestClass},
        transport::RpcTransport,
    },
    utils::quantity::value_to_u64,
};

const BLOCK_NUMBER_METHOD: &str = "eth_blockNumber";

pub struct HeightConsensus {
    window: u64,
    /// Highest height ever returned. Zero until the first successful query.
    ratchet: AtomicU64,
}

impl HeightConsensus {
    #[must_use]
    pub fn new(window: u64) -> Self {
        Self { window, ratchet: AtomicU64::new(0) }
    }

    #[must_use]
    pub fn window(&self) -> u64 {
        self.window
    }

    /// Returns the last height handed out, or `None` before the first query.
    #[must_use]
    pub fn current(&self) -> Option<u64> {
        match self.ratchet.load(Ordering::Acquire) {
            0 => None,
            height => Some(height),
        }
    }

    /// Folds one round of observations into the ratchet.
    ///
    /// Returns `max(selected, previous)`, or `None` if there were no
    /// observations. The ratchet is never lowered, even by concurrent callers.
    pub fn observe(&self, observations: &[u64]) -> Option<u64> {
        let selected = quorum::select_height(observations, self.window)?;
        let previous = self.ratchet.fetch_max(selected, Ordering::AcqRel);

        if selected < previous {
            debug!(selected, ratchet = previous, "consensus height below ratchet, holding");
        } else if selected > previous {
            debug!(height = selected, previous, "consensus height advanced");
        }

        Some(selected.max(previous))
    }

    /// Queries every endpoint for its height and returns the trusted height.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::AllNodesFailed`] if no endpoint reported a height.
    pub async fn query(&self, executor: &FanOutExecutor) -> Result<u64, UpstreamError> {
        let outcomes = executor
            .collect(
                BLOCK_NUMBER_METHOD,
                RequestClass::Height,
                |endpoint: Arc<dyn RpcTransport>| async move {
                    let raw = endpoint.request(BLOCK_NUMBER_METHOD, json!([])).await?;
                    value_to_u64(&raw).map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
                },
                None,
            )
            .await;

        let queried = outcomes.len();
        let observations: Vec<u64> =
            outcomes.into_iter().filter_map(|o| o.outcome.success()).collect();

        debug!(observations = ?observations, queried, "collected height observations");

        let height = self.observe(&observations).ok_or_else(|| UpstreamError::AllNodesFailed {
            method: BLOCK_NUMBER_METHOD.to_string(),
            endpoints: queried,
        })?;

        if observations.len() < queried {
            info!(
                height,
                responded = observations.len(),
                queried,
                "consensus height from partial endpoint set"
            );
        }

        Ok(height)
    }
}
