//! Height consensus against a mixed set of endpoints: one that never answers,
//! one far behind, and several healthy ones slightly apart.

use keel_core::{
    provider::ChainProvider,
    upstream::{consensus::select_height, UpstreamError},
};
use std::time::{Duration, Instant};

use crate::mock_infrastructure::{fast_rpc_config, provider_for, RpcMockBuilder, SilentNode};

async fn node_at(height: u64) -> RpcMockBuilder {
    let mut node = RpcMockBuilder::new().await;
    node.mock_block_number(height);
    node
}

#[tokio::test]
async fn test_consensus_ignores_timeouts_and_laggards() {
    let silent = SilentNode::bind();
    let lagging = node_at(50).await;
    let a = node_at(100).await;
    let b = node_at(101).await;
    let c = node_at(99).await;

    let provider =
        provider_for(&[silent.url(), lagging.url(), a.url(), b.url(), c.url()], fast_rpc_config());

    let started = Instant::now();
    let height = provider.block_number().await.unwrap();

    assert_eq!(height, 101);
    assert_eq!(height, select_height(&[50, 100, 101, 99], 5).unwrap());
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "silent endpoint is bounded by the height timeout"
    );
    assert_eq!(provider.last_consensus_height(), Some(101));
}

#[tokio::test]
async fn test_height_never_goes_backwards() {
    let mut a = node_at(100).await;
    let mut b = node_at(100).await;

    let provider = provider_for(&[a.url(), b.url()], fast_rpc_config());
    assert_eq!(provider.block_number().await.unwrap(), 100);

    // Both nodes fall back, e.g. after being swapped for a lagging replica.
    a.reset().mock_block_number(90);
    b.reset().mock_block_number(91);
    assert_eq!(provider.block_number().await.unwrap(), 100);

    a.reset().mock_block_number(110);
    b.reset().mock_block_number(112);
    assert_eq!(provider.block_number().await.unwrap(), 112);
}

#[tokio::test]
async fn test_no_observations_is_an_error() {
    let silent = SilentNode::bind();
    let mut broken = RpcMockBuilder::new().await;
    broken.mock_server_error();

    let provider = provider_for(&[silent.url(), broken.url()], fast_rpc_config());
    let err = provider.block_number().await.unwrap_err();

    assert!(matches!(err, UpstreamError::AllNodesFailed { endpoints: 2, .. }), "{err:?}");
    assert_eq!(provider.last_consensus_height(), None);
}
