//! Fixtures and provider wiring shared by the integration tests.

use keel_core::{
    config::RpcConfig,
    provider::{ResilientProvider, ResilientProviderBuilder},
    upstream::EndpointConfig,
};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};

/// Hash of the `index`-th transaction in `block_number`.
#[must_use]
pub fn tx_hash(block_number: u64, index: u64) -> String {
    format!("0x{:064x}", block_number * 1000 + index)
}

/// Transaction object as returned by `eth_getTransactionByHash`.
#[must_use]
pub fn create_transaction(block_number: u64, index: u64) -> Value {
    json!({
        "hash": tx_hash(block_number, index),
        "nonce": format!("0x{index:x}"),
        "blockHash": format!("0x{block_number:064x}"),
        "blockNumber": format!("0x{block_number:x}"),
        "transactionIndex": format!("0x{index:x}"),
        "from": "0x0000000000000000000000000000000000000001",
        "to": "0x0000000000000000000000000000000000000002",
        "value": "0x0",
        "gas": "0x5208",
        "maxFeePerGas": "0x77359400",
        "maxPriorityFeePerGas": "0x59682f00",
        "chainId": "0x1",
        "input": "0x"
    })
}

fn block_json(block_number: u64, transactions: Vec<Value>) -> Value {
    json!({
        "number": format!("0x{block_number:x}"),
        "hash": format!("0x{block_number:064x}"),
        "parentHash": format!("0x{:064x}", block_number.saturating_sub(1)),
        "timestamp": format!("0x{:x}", 1_600_000_000 + block_number),
        "transactions": transactions,
        "gasLimit": "0x1c9c380",
        "gasUsed": "0x5208",
        "baseFeePerGas": "0x7",
        "miner": "0x0000000000000000000000000000000000000000"
    })
}

/// Block with `tx_count` full transaction objects.
#[must_use]
pub fn create_test_block(block_number: u64, tx_count: u64) -> Value {
    block_json(block_number, (0..tx_count).map(|i| create_transaction(block_number, i)).collect())
}

/// Block that lists its `tx_count` transactions by hash only.
#[must_use]
pub fn create_hash_block(block_number: u64, tx_count: u64) -> Value {
    block_json(block_number, (0..tx_count).map(|i| json!(tx_hash(block_number, i))).collect())
}

/// Block still being built: no hash yet.
#[must_use]
pub fn create_pending_block(block_number: u64) -> Value {
    let mut block = block_json(block_number, Vec::new());
    block["hash"] = Value::Null;
    block
}

#[must_use]
pub fn create_test_log(block_number: u64, log_index: u64) -> Value {
    json!({
        "address": "0x0000000000000000000000000000000000000001",
        "blockNumber": format!("0x{block_number:x}"),
        "blockHash": format!("0x{block_number:064x}"),
        "logIndex": format!("0x{log_index:x}"),
        "transactionHash": format!("0x{:064x}", block_number * 100 + log_index),
        "transactionIndex": "0x0",
        "topics": [format!("0x{log_index:064x}")],
        "data": "0x",
        "removed": false
    })
}

/// One log per block over `from..=to`.
#[must_use]
pub fn create_test_logs(from_block: u64, to_block: u64) -> Vec<Value> {
    (from_block..=to_block).map(|block| create_test_log(block, 0)).collect()
}

/// RPC settings with short class timeouts so failing endpoints resolve quickly.
#[must_use]
pub fn fast_rpc_config() -> RpcConfig {
    RpcConfig {
        height_timeout_ms: 300,
        request_timeout_ms: 1_000,
        receipt_poll_interval_ms: 50,
        ..RpcConfig::default()
    }
}

#[must_use]
pub fn endpoint_config(name: &str, url: String) -> EndpointConfig {
    EndpointConfig { name: Arc::from(name), url, timeout: Duration::from_secs(5) }
}

/// Resilient provider over `urls`, named `node-0`, `node-1`, ... in order.
///
/// # Panics
///
/// Panics if the provider cannot be built.
#[must_use]
pub fn provider_for(urls: &[String], rpc: RpcConfig) -> ResilientProvider {
    urls.iter()
        .enumerate()
        .fold(ResilientProviderBuilder::new(), |builder, (i, url)| {
            builder.endpoint(endpoint_config(&format!("node-{i}"), url.clone()))
        })
        .rpc_config(rpc)
        .build()
        .expect("provider builds")
}
