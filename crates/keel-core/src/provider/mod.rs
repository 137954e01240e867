//! Chain query surface.
//!
//! [`ChainProvider`] is the capability consumers program against. Two
//! implementations exist:
//!
//! - [`SingleProvider`]: one endpoint, every call forwarded as-is
//! - [`ResilientProvider`]: every call fanned out to all endpoints, with
//!   per-operation validation and consensus height
//!
//! Confirmation waiting and batched calls are provided methods built on the
//! required ones, so both implementations share them.

pub mod builder;
pub(crate) mod methods;
pub mod resilient;
pub mod single;

pub use builder::{BuilderError, ResilientProviderBuilder};
pub use resilient::ResilientProvider;
pub use single::SingleProvider;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

use crate::{
    chain::{BlockRecord, FeeData, Receipt, TransactionRecord},
    config::DEFAULT_MULTICALL_ADDRESS,
    upstream::UpstreamError,
    utils::{format_hex_u64, BlockId},
};

/// Default poll interval of [`ChainProvider::wait_for_confirmation`].
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Read-only call against a contract. `data` is pre-encoded calldata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRequest {
    pub to: String,
    pub data: String,
    pub from: Option<String>,
    pub value: Option<u128>,
    pub gas: Option<u64>,
}

impl CallRequest {
    #[must_use]
    pub fn new(to: impl Into<String>, data: impl Into<String>) -> Self {
        Self { to: to.into(), data: data.into(), ..Self::default() }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("to".into(), json!(self.to));
        object.insert("data".into(), json!(self.data));
        if let Some(from) = &self.from {
            object.insert("from".into(), json!(from));
        }
        if let Some(value) = self.value {
            object.insert("value".into(), json!(format!("0x{value:x}")));
        }
        if let Some(gas) = self.gas {
            object.insert("gas".into(), json!(format_hex_u64(gas)));
        }
        Value::Object(object)
    }
}

/// `eth_getLogs` filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub from_block: Option<BlockId>,
    pub to_block: Option<BlockId>,
    /// Empty matches every address.
    pub addresses: Vec<String>,
    /// Positional topic filters; `None` matches anything at that position.
    pub topics: Vec<Option<Vec<String>>>,
}

impl LogFilter {
    #[must_use]
    pub fn range(from: impl Into<BlockId>, to: impl Into<BlockId>) -> Self {
        Self { from_block: Some(from.into()), to_block: Some(to.into()), ..Self::default() }
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.addresses.push(address.into());
        self
    }

    #[must_use]
    pub fn topic(mut self, position: usize, values: Vec<String>) -> Self {
        if self.topics.len() <= position {
            self.topics.resize(position + 1, None);
        }
        self.topics[position] = Some(values);
        self
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        if let Some(from) = &self.from_block {
            object.insert("fromBlock".into(), json!(from.to_param()));
        }
        if let Some(to) = &self.to_block {
            object.insert("toBlock".into(), json!(to.to_param()));
        }
        match self.addresses.as_slice() {
            [] => {}
            [single] => {
                object.insert("address".into(), json!(single));
            }
            many => {
                object.insert("address".into(), json!(many));
            }
        }
        if !self.topics.is_empty() {
            object.insert("topics".into(), json!(self.topics));
        }
        Value::Object(object)
    }
}

/// Read access to a chain through one or more JSON-RPC endpoints.
///
/// `null` results (unknown block, transaction or receipt) are errors; see
/// [`crate::chain`].
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Current chain height.
    async fn block_number(&self) -> Result<u64, UpstreamError>;

    /// Block by number, tag or hash, with full transaction objects if `full`.
    async fn block(&self, id: BlockId, full: bool) -> Result<BlockRecord, UpstreamError>;

    /// Balance in wei.
    async fn balance(&self, address: &str, at: BlockId) -> Result<u128, UpstreamError>;

    async fn fee_data(&self) -> Result<FeeData, UpstreamError>;

    async fn transaction(&self, hash: &str) -> Result<TransactionRecord, UpstreamError>;

    async fn receipt(&self, hash: &str) -> Result<Receipt, UpstreamError>;

    /// `eth_call`; returns the raw hex result.
    async fn call(&self, request: &CallRequest, at: BlockId) -> Result<String, UpstreamError>;

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<Value>, UpstreamError>;

    /// Arbitrary method, result returned undecoded.
    async fn raw_request(&self, method: &str, params: Value) -> Result<Value, UpstreamError>;

    fn multicall_address(&self) -> &str {
        DEFAULT_MULTICALL_ADDRESS
    }

    fn receipt_poll_interval(&self) -> Duration {
        DEFAULT_RECEIPT_POLL_INTERVAL
    }

    /// `eth_call` against the multicall helper with caller-encoded calldata.
    async fn batch_call(&self, calldata: &str, at: BlockId) -> Result<String, UpstreamError> {
        let request = CallRequest::new(self.multicall_address(), calldata);
        self.call(&request, at).await
    }

    /// Polls until the transaction's receipt is `confirmations` blocks deep.
    ///
    /// The receipt's own block counts as the first confirmation; `0` is treated
    /// as `1`. Failed polls are retried until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::ConfirmationTimeout`] if the depth is not reached
    /// in time.
    async fn wait_for_confirmation(
        &self,
        hash: &str,
        confirmations: u64,
        timeout: Duration,
    ) -> Result<Receipt, UpstreamError> {
        let wanted = confirmations.max(1);
        let interval = self.receipt_poll_interval();

        let poll = async {
            loop {
                match self.receipt(hash).await {
                    Ok(receipt) if receipt.block_number.is_some() => {
                        match self.block_number().await {
                            Ok(tip) if receipt.confirmations(tip) >= wanted => return receipt,
                            Ok(tip) => debug!(
                                tx = %hash,
                                depth = receipt.confirmations(tip),
                                wanted,
                                "waiting for confirmations"
                            ),
                            Err(e) => debug!(tx = %hash, error = %e, "height poll failed"),
                        }
                    }
                    Ok(_) => debug!(tx = %hash, "receipt not yet in a block"),
                    Err(e) => debug!(tx = %hash, error = %e, "receipt not available"),
                }
                tokio::time::sleep(interval).await;
            }
        };

        tokio::time::timeout(timeout, poll).await.map_err(|_| UpstreamError::ConfirmationTimeout {
            hash: hash.to_string(),
            confirmations: wanted,
        })
    }
}
