//! The multi-endpoint facade.
//!
//! Every call goes to all endpoints through the [`FanOutExecutor`]:
//!
//! | Operation | Selection | Validator |
//! |-----------|-----------|-----------|
//! | `block_number` | consensus window + ratchet | decodes |
//! | `block` | first valid, configured order | has a hash |
//! | `transaction` | first valid | has a hash |
//! | `receipt` | first valid | has a status |
//! | `balance`, `call`, `raw_request` | first valid | decodes |
//! | `logs` | longest list, earliest on tie | decodes |

use async_trait::async_trait;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};

use super::{methods, CallRequest, ChainProvider, LogFilter};
use crate::{
    chain::{BlockRecord, FeeData, Receipt, TransactionRecord},
    upstream::{
        FailurePolicy, FanOutExecutor, HeightConsensus, RequestClass, RpcTransport, UpstreamError,
        Validator,
    },
    utils::BlockId,
};

pub struct ResilientProvider {
    executor: FanOutExecutor,
    consensus: HeightConsensus,
    multicall_address: String,
    receipt_poll_interval: Duration,
    logs_policy: FailurePolicy,
}

impl ResilientProvider {
    /// Use [`super::ResilientProviderBuilder`] to construct one from configuration.
    pub(crate) fn new(
        executor: FanOutExecutor,
        consensus_window: u64,
        multicall_address: String,
        receipt_poll_interval: Duration,
        logs_policy: FailurePolicy,
    ) -> Self {
        Self {
            executor,
            consensus: HeightConsensus::new(consensus_window),
            multicall_address,
            receipt_poll_interval,
            logs_policy,
        }
    }

    #[must_use]
    pub fn endpoints(&self) -> &[Arc<dyn RpcTransport>] {
        self.executor.endpoints()
    }

    /// Highest height handed out so far, without querying.
    #[must_use]
    pub fn last_consensus_height(&self) -> Option<u64> {
        self.consensus.current()
    }

    /// Log query with an explicit failure policy.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::AllNodesFailed`] under [`FailurePolicy::FailFast`]
    /// when every endpoint failed.
    pub async fn logs_with_policy(
        &self,
        filter: &LogFilter,
        policy: FailurePolicy,
    ) -> Result<Vec<Value>, UpstreamError> {
        let params = json!([filter.to_json()]);
        self.executor
            .longest(
                methods::GET_LOGS,
                RequestClass::Logs,
                |endpoint: Arc<dyn RpcTransport>| {
                    let params = params.clone();
                    async move {
                        endpoint.request(methods::GET_LOGS, params).await.and_then(methods::parse_logs)
                    }
                },
                policy,
            )
            .await
    }
}

#[async_trait]
impl ChainProvider for ResilientProvider {
    async fn block_number(&self) -> Result<u64, UpstreamError> {
        self.consensus.query(&self.executor).await
    }

    async fn block(&self, id: BlockId, full: bool) -> Result<BlockRecord, UpstreamError> {
        self.executor
            .request(
                id.block_method(),
                methods::block_params(&id, full),
                RequestClass::Standard,
                methods::parse_block,
                Some(methods::block_is_sealed as Validator<BlockRecord>),
            )
            .await
    }

    async fn balance(&self, address: &str, at: BlockId) -> Result<u128, UpstreamError> {
        self.executor
            .request(
                methods::GET_BALANCE,
                json!([address, at.to_param()]),
                RequestClass::Standard,
                methods::parse_u128,
                None,
            )
            .await
    }

    async fn fee_data(&self) -> Result<FeeData, UpstreamError> {
        let (gas_price, latest, priority) = tokio::join!(
            self.executor.request(
                methods::GAS_PRICE,
                json!([]),
                RequestClass::Standard,
                methods::parse_u128,
                None,
            ),
            self.block(BlockId::latest(), false),
            self.executor.request(
                methods::MAX_PRIORITY_FEE,
                json!([]),
                RequestClass::Standard,
                methods::parse_u128,
                None,
            ),
        );
        Ok(FeeData::from_parts(gas_price.ok(), latest?.base_fee_per_gas, priority.ok()))
    }

    async fn transaction(&self, hash: &str) -> Result<TransactionRecord, UpstreamError> {
        self.executor
            .request(
                methods::GET_TRANSACTION,
                json!([hash]),
                RequestClass::Standard,
                methods::parse_transaction,
                Some(methods::transaction_has_hash as Validator<TransactionRecord>),
            )
            .await
    }

    async fn receipt(&self, hash: &str) -> Result<Receipt, UpstreamError> {
        self.executor
            .request(
                methods::GET_RECEIPT,
                json!([hash]),
                RequestClass::Standard,
                methods::parse_receipt,
                Some(methods::receipt_has_status as Validator<Receipt>),
            )
            .await
    }

    async fn call(&self, request: &CallRequest, at: BlockId) -> Result<String, UpstreamError> {
        self.executor
            .request(
                methods::CALL,
                json!([request.to_json(), at.to_param()]),
                RequestClass::Standard,
                methods::parse_data,
                None,
            )
            .await
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<Value>, UpstreamError> {
        self.logs_with_policy(filter, self.logs_policy).await
    }

    async fn raw_request(&self, method: &str, params: Value) -> Result<Value, UpstreamError> {
        self.executor
            .request(method, params, RequestClass::Standard, methods::identity, None)
            .await
    }

    fn multicall_address(&self) -> &str {
        &self.multicall_address
    }

    fn receipt_poll_interval(&self) -> Duration {
        self.receipt_poll_interval
    }
}
