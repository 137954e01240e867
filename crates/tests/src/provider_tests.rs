//! Log and receipt queries through the resilient provider.

use keel_core::{
    config::RpcConfig,
    provider::{ChainProvider, LogFilter},
    upstream::{FailurePolicy, UpstreamError},
};
use serde_json::json;
use std::time::Duration;

use crate::mock_infrastructure::{
    create_test_logs, fast_rpc_config, provider_for, RpcMockBuilder, SilentNode,
};

fn filter() -> LogFilter {
    LogFilter::range(100u64, 110u64).address("0x0000000000000000000000000000000000000001")
}

#[tokio::test]
async fn test_logs_take_longest_answer() {
    let mut short = RpcMockBuilder::new().await;
    short.mock_get_logs(&create_test_logs(100, 104));
    let mut long = RpcMockBuilder::new().await;
    long.mock_get_logs(&create_test_logs(100, 110));
    let mut medium = RpcMockBuilder::new().await;
    medium.mock_get_logs(&create_test_logs(100, 107));

    let provider = provider_for(&[short.url(), long.url(), medium.url()], fast_rpc_config());
    let logs = provider.logs(&filter()).await.unwrap();

    assert_eq!(logs.len(), 11);
}

#[tokio::test]
async fn test_logs_tie_goes_to_first_endpoint() {
    let mut first = RpcMockBuilder::new().await;
    first.mock_get_logs(&create_test_logs(100, 102));
    let mut second = RpcMockBuilder::new().await;
    second.mock_get_logs(&create_test_logs(200, 202));

    let provider = provider_for(&[first.url(), second.url()], fast_rpc_config());
    let logs = provider.logs(&filter()).await.unwrap();

    assert_eq!(logs[0]["blockNumber"], json!("0x64"));
}

#[tokio::test]
async fn test_logs_failure_policy() {
    let silent = SilentNode::bind();
    let mut broken = RpcMockBuilder::new().await;
    broken.mock_rpc_error("eth_getLogs", -32005, "query returned more than 10000 results");

    // Log requests get three times the standard timeout.
    let rpc = RpcConfig { request_timeout_ms: 100, ..fast_rpc_config() };
    let provider = provider_for(&[silent.url(), broken.url()], rpc);

    let degraded = provider.logs(&filter()).await.unwrap();
    assert!(degraded.is_empty());

    let err = provider.logs_with_policy(&filter(), FailurePolicy::FailFast).await.unwrap_err();
    assert!(matches!(err, UpstreamError::AllNodesFailed { .. }), "{err:?}");
}

fn receipt_json(block_number: u64) -> serde_json::Value {
    json!({
        "transactionHash": "0xfeed",
        "blockNumber": format!("0x{block_number:x}"),
        "blockHash": format!("0x{block_number:064x}"),
        "status": "0x1",
        "gasUsed": "0x5208",
        "contractAddress": null,
        "logs": []
    })
}

#[tokio::test]
async fn test_wait_for_confirmation() {
    let mut node = RpcMockBuilder::new().await;
    node.mock_method("eth_getTransactionReceipt", &receipt_json(100)).mock_block_number(102);

    let provider = provider_for(&[node.url()], fast_rpc_config());
    let receipt =
        provider.wait_for_confirmation("0xfeed", 3, Duration::from_secs(5)).await.unwrap();

    assert!(receipt.succeeded());
    assert_eq!(receipt.confirmations(102), 3);
}

#[tokio::test]
async fn test_wait_for_confirmation_times_out() {
    let mut node = RpcMockBuilder::new().await;
    node.mock_method("eth_getTransactionReceipt", &receipt_json(100)).mock_block_number(100);

    let provider = provider_for(&[node.url()], fast_rpc_config());
    let err = provider
        .wait_for_confirmation("0xfeed", 5, Duration::from_millis(400))
        .await
        .unwrap_err();

    assert!(
        matches!(err, UpstreamError::ConfirmationTimeout { confirmations: 5, .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_unmined_receipt_is_an_error() {
    let mut node = RpcMockBuilder::new().await;
    node.mock_null("eth_getTransactionReceipt");

    let provider = provider_for(&[node.url()], fast_rpc_config());
    assert!(provider.receipt("0xfeed").await.is_err());
}
