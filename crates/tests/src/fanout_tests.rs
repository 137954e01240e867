//! First-valid selection over real HTTP endpoints.
//!
//! Endpoint order is the configured order; the first endpoint whose answer
//! parses and validates wins, whatever the others return.

use keel_core::{provider::ChainProvider, upstream::UpstreamError, utils::BlockId};
use serde_json::json;

use crate::mock_infrastructure::{
    create_pending_block, create_test_block, fast_rpc_config, provider_for, RpcMockBuilder,
    SilentNode,
};

#[tokio::test]
async fn test_first_healthy_endpoint_in_order_wins() {
    let mut failing = RpcMockBuilder::new().await;
    failing.mock_server_error();

    let mut second = RpcMockBuilder::new().await;
    second.mock_get_block_by_number(100, &create_test_block(100, 1));

    let mut third = RpcMockBuilder::new().await;
    third.mock_get_block_by_number(100, &create_test_block(100, 3));

    let provider = provider_for(&[failing.url(), second.url(), third.url()], fast_rpc_config());
    let block = provider.block(BlockId::Number(100), true).await.unwrap();

    assert_eq!(block.number, 100);
    assert_eq!(block.transactions.len(), 1, "second endpoint's answer is used");
}

#[tokio::test]
async fn test_null_and_unsealed_blocks_fall_through() {
    let mut null_node = RpcMockBuilder::new().await;
    null_node.mock_null("eth_getBlockByNumber");

    let mut pending_node = RpcMockBuilder::new().await;
    pending_node.mock_get_block_by_number(7, &create_pending_block(7));

    let mut sealed_node = RpcMockBuilder::new().await;
    sealed_node.mock_get_block_by_number(7, &create_test_block(7, 0));

    let provider =
        provider_for(&[null_node.url(), pending_node.url(), sealed_node.url()], fast_rpc_config());
    let block = provider.block(BlockId::Number(7), false).await.unwrap();

    assert_eq!(block.hash.as_deref(), Some(format!("0x{:064x}", 7).as_str()));
    assert!(null_node.verify_all_called());
    assert!(pending_node.verify_all_called());
}

#[tokio::test]
async fn test_timed_out_endpoint_is_skipped() {
    let silent = SilentNode::bind();

    let mut healthy = RpcMockBuilder::new().await;
    healthy.mock_method("eth_getBalance", &json!("0xde0b6b3a7640000"));

    let provider = provider_for(&[silent.url(), healthy.url()], fast_rpc_config());
    let balance = provider
        .balance("0x0000000000000000000000000000000000000001", BlockId::latest())
        .await
        .unwrap();

    assert_eq!(balance, 1_000_000_000_000_000_000);
}

#[tokio::test]
async fn test_all_endpoints_failing() {
    let mut a = RpcMockBuilder::new().await;
    a.mock_rpc_error("eth_getTransactionByHash", -32000, "header not found");
    let mut b = RpcMockBuilder::new().await;
    b.mock_null("eth_getTransactionByHash");

    let provider = provider_for(&[a.url(), b.url()], fast_rpc_config());
    let err = provider.transaction("0xabc").await.unwrap_err();

    match err {
        UpstreamError::AllNodesFailed { method, endpoints } => {
            assert_eq!(method, "eth_getTransactionByHash");
            assert_eq!(endpoints, 2);
        }
        other => panic!("expected AllNodesFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fee_data_combines_sources() {
    let mut node = RpcMockBuilder::new().await;
    node.mock_method("eth_gasPrice", &json!("0x3b9aca00"))
        .mock_method("eth_getBlockByNumber", &create_test_block(50, 0))
        .mock_rpc_error("eth_maxPriorityFeePerGas", -32601, "method not found");

    let provider = provider_for(&[node.url()], fast_rpc_config());
    let fees = provider.fee_data().await.unwrap();

    assert_eq!(fees.gas_price, Some(1_000_000_000));
    assert_eq!(fees.last_base_fee, Some(7));
    // Missing priority fee falls back to the 1.5 gwei default.
    assert_eq!(fees.max_priority_fee_per_gas, Some(1_500_000_000));
    assert_eq!(fees.max_fee_per_gas, Some(2 * 7 + 1_500_000_000));
}
