use async_trait::async_trait;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};

use super::{methods, CallRequest, ChainProvider, LogFilter, DEFAULT_RECEIPT_POLL_INTERVAL};
use crate::{
    chain::{BlockRecord, FeeData, Receipt, TransactionRecord},
    config::DEFAULT_MULTICALL_ADDRESS,
    upstream::{RpcTransport, UpstreamError},
    utils::{BlockId, BlockTag},
};

/// Provider backed by exactly one endpoint. No fan-out, no validation beyond
/// decoding.
pub struct SingleProvider {
    transport: Arc<dyn RpcTransport>,
    multicall_address: String,
    receipt_poll_interval: Duration,
}

impl SingleProvider {
    #[must_use]
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            multicall_address: DEFAULT_MULTICALL_ADDRESS.to_string(),
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_multicall_address(mut self, address: impl Into<String>) -> Self {
        self.multicall_address = address.into();
        self
    }

    #[must_use]
    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    async fn send<T>(
        &self,
        method: &str,
        params: Value,
        parse: fn(Value) -> Result<T, UpstreamError>,
    ) -> Result<T, UpstreamError> {
        self.transport.request(method, params).await.and_then(parse)
    }
}

#[async_trait]
impl ChainProvider for SingleProvider {
    async fn block_number(&self) -> Result<u64, UpstreamError> {
        self.send(methods::BLOCK_NUMBER, json!([]), methods::parse_u64).await
    }

    async fn block(&self, id: BlockId, full: bool) -> Result<BlockRecord, UpstreamError> {
        self.send(id.block_method(), methods::block_params(&id, full), methods::parse_block).await
    }

    async fn balance(&self, address: &str, at: BlockId) -> Result<u128, UpstreamError> {
        self.send(methods::GET_BALANCE, json!([address, at.to_param()]), methods::parse_u128).await
    }

    async fn fee_data(&self) -> Result<FeeData, UpstreamError> {
        let (gas_price, latest, priority) = tokio::join!(
            self.send(methods::GAS_PRICE, json!([]), methods::parse_u128),
            self.block(BlockId::Tag(BlockTag::Latest), false),
            self.send(methods::MAX_PRIORITY_FEE, json!([]), methods::parse_u128),
        );
        Ok(FeeData::from_parts(gas_price.ok(), latest?.base_fee_per_gas, priority.ok()))
    }

    async fn transaction(&self, hash: &str) -> Result<TransactionRecord, UpstreamError> {
        self.send(methods::GET_TRANSACTION, json!([hash]), methods::parse_transaction).await
    }

    async fn receipt(&self, hash: &str) -> Result<Receipt, UpstreamError> {
        self.send(methods::GET_RECEIPT, json!([hash]), methods::parse_receipt).await
    }

    async fn call(&self, request: &CallRequest, at: BlockId) -> Result<String, UpstreamError> {
        self.send(methods::CALL, json!([request.to_json(), at.to_param()]), methods::parse_data)
            .await
    }

    async fn logs(&self, filter: &LogFilter) -> Result<Vec<Value>, UpstreamError> {
        self.send(methods::GET_LOGS, json!([filter.to_json()]), methods::parse_logs).await
    }

    async fn raw_request(&self, method: &str, params: Value) -> Result<Value, UpstreamError> {
        self.send(method, params, methods::identity).await
    }

    fn multicall_address(&self) -> &str {
        &self.multicall_address
    }

    fn receipt_poll_interval(&self) -> Duration {
        self.receipt_poll_interval
    }
}
