//! Method names, parameter encoding and result decoding shared by the
//! providers.

use serde_json::{json, Value};

use crate::{
    chain::{BlockRecord, Receipt, TransactionRecord},
    upstream::UpstreamError,
    utils::{quantity, BlockId},
};

pub(crate) const BLOCK_NUMBER: &str = "eth_blockNumber";
pub(crate) const GET_BALANCE: &str = "eth_getBalance";
pub(crate) const GAS_PRICE: &str = "eth_gasPrice";
pub(crate) const MAX_PRIORITY_FEE: &str = "eth_maxPriorityFeePerGas";
pub(crate) const GET_TRANSACTION: &str = "eth_getTransactionByHash";
pub(crate) const GET_RECEIPT: &str = "eth_getTransactionReceipt";
pub(crate) const CALL: &str = "eth_call";
pub(crate) const GET_LOGS: &str = "eth_getLogs";

pub(crate) fn block_params(id: &BlockId, full: bool) -> Value {
    json!([id.to_param(), full])
}

pub(crate) fn identity(value: Value) -> Result<Value, UpstreamError> {
    Ok(value)
}

pub(crate) fn parse_u64(value: Value) -> Result<u64, UpstreamError> {
    quantity::value_to_u64(&value).map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
}

pub(crate) fn parse_u128(value: Value) -> Result<u128, UpstreamError> {
    quantity::value_to_u128(&value).map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
}

pub(crate) fn parse_block(value: Value) -> Result<BlockRecord, UpstreamError> {
    BlockRecord::from_rpc(&value)
}

pub(crate) fn parse_transaction(value: Value) -> Result<TransactionRecord, UpstreamError> {
    TransactionRecord::from_rpc(&value)
}

pub(crate) fn parse_receipt(value: Value) -> Result<Receipt, UpstreamError> {
    Receipt::from_rpc(&value)
}

/// Hex-encoded return data of `eth_call`.
pub(crate) fn parse_data(value: Value) -> Result<String, UpstreamError> {
    match value {
        Value::String(data) if data.starts_with("0x") => Ok(data),
        other => Err(UpstreamError::InvalidResponse(format!("expected hex data, got {other}"))),
    }
}

pub(crate) fn parse_logs(value: Value) -> Result<Vec<Value>, UpstreamError> {
    match value {
        Value::Array(logs) => Ok(logs),
        other => Err(UpstreamError::InvalidResponse(format!("expected log array, got {other}"))),
    }
}

pub(crate) fn block_is_sealed(block: &BlockRecord) -> bool {
    block.is_sealed()
}

pub(crate) fn transaction_has_hash(tx: &TransactionRecord) -> bool {
    !tx.hash.is_empty()
}

pub(crate) fn receipt_has_status(receipt: &Receipt) -> bool {
    receipt.status.is_some()
}
