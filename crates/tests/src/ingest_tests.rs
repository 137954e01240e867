//! Block ingestion against a mocked node, including restarts from a
//! checkpoint file.

use keel_core::{
    config::{IngestConfig, RpcConfig},
    ingest::{
        BlockIngestor, CheckpointStore, FileCheckpoint, IngestorHandle, TransactionEvent,
    },
    provider::{ChainProvider, ResilientProvider},
};
use std::{path::Path, sync::Arc, time::Duration};
use tokio::sync::mpsc;

use crate::mock_infrastructure::{
    create_hash_block, create_test_block, create_transaction, fast_rpc_config, provider_for,
    tx_hash, RpcMockBuilder, SilentNode,
};

const TXS_PER_BLOCK: u64 = 2;

/// Serves blocks `90..=110` by hash with their transactions, at `height`.
fn serve_chain(node: &mut RpcMockBuilder, height: u64) {
    node.reset().mock_block_number(height);
    for number in 90..=110 {
        node.mock_get_block_by_number(number, &create_hash_block(number, TXS_PER_BLOCK));
        for index in 0..TXS_PER_BLOCK {
            node.mock_get_transaction(
                &tx_hash(number, index),
                &create_transaction(number, index),
            );
        }
    }
}

fn ingest_config() -> IngestConfig {
    IngestConfig {
        poll_interval_ms: 50,
        retry_delay_ms: 20,
        full_transactions: false,
        ..IngestConfig::default()
    }
}

struct Run {
    handle: IngestorHandle,
    blocks: mpsc::UnboundedReceiver<u64>,
    transactions: mpsc::UnboundedReceiver<TransactionEvent>,
}

async fn start(node: &RpcMockBuilder, checkpoint_path: &Path) -> Run {
    start_with(provider_for(&[node.url()], fast_rpc_config()), checkpoint_path, ingest_config())
        .await
}

async fn start_with(
    provider: ResilientProvider,
    checkpoint_path: &Path,
    config: IngestConfig,
) -> Run {
    let provider: Arc<dyn ChainProvider> = Arc::new(provider);
    let checkpoint: Arc<dyn CheckpointStore> = Arc::new(FileCheckpoint::new(checkpoint_path));
    let ingestor = BlockIngestor::new(provider, checkpoint, config);

    let (block_tx, blocks) = mpsc::unbounded_channel();
    ingestor.events().on_block(move |event| {
        let _ = block_tx.send(event.block.number);
    });
    let (tx_tx, transactions) = mpsc::unbounded_channel();
    ingestor.events().on_transaction(move |event| {
        let _ = tx_tx.send(event.clone());
    });

    Run { handle: ingestor.start().await.unwrap(), blocks, transactions }
}

async fn next_blocks(run: &mut Run, count: usize) -> Vec<u64> {
    let mut seen = Vec::with_capacity(count);
    while seen.len() < count {
        let number = tokio::time::timeout(Duration::from_secs(10), run.blocks.recv())
            .await
            .expect("block within timeout")
            .expect("ingestion still running");
        seen.push(number);
    }
    seen
}

async fn stop(run: Run) {
    run.handle.stop();
    run.handle.join().await.unwrap();
}

#[tokio::test]
async fn test_ingestion_is_contiguous_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cursor.json");
    FileCheckpoint::new(&path).save(100).await.unwrap();

    let mut node = RpcMockBuilder::new().await;
    serve_chain(&mut node, 105);

    let mut run = start(&node, &path).await;
    assert_eq!(next_blocks(&mut run, 5).await, vec![101, 102, 103, 104, 105]);

    let mut transactions = Vec::new();
    while let Ok(event) = run.transactions.try_recv() {
        transactions.push(event);
    }
    assert_eq!(transactions.len(), 10);
    assert_eq!(transactions[0].transaction.hash, tx_hash(101, 0));
    assert_eq!(transactions[3].source.block_number, 102);
    assert_eq!(transactions[3].source.index, 1);

    stop(run).await;
    assert_eq!(FileCheckpoint::new(&path).load().await.unwrap(), Some(105));

    serve_chain(&mut node, 108);
    let mut run = start(&node, &path).await;
    assert_eq!(next_blocks(&mut run, 3).await, vec![106, 107, 108]);

    // Nothing beyond the tip.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(run.blocks.try_recv().is_err());
    assert_eq!(run.handle.last_processed(), 108);
    stop(run).await;
}

#[tokio::test]
async fn test_stale_checkpoint_replays_only_the_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cursor.json");
    FileCheckpoint::new(&path).save(10).await.unwrap();

    let mut node = RpcMockBuilder::new().await;
    serve_chain(&mut node, 105);

    let mut run = start(&node, &path).await;
    assert_eq!(next_blocks(&mut run, 10).await, (96..=105).collect::<Vec<_>>());
    stop(run).await;
}

#[tokio::test]
async fn test_first_run_starts_after_head() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cursor.json");

    let mut node = RpcMockBuilder::new().await;
    serve_chain(&mut node, 100);

    let mut run = start(&node, &path).await;
    assert_eq!(FileCheckpoint::new(&path).load().await.unwrap(), Some(100));
    assert_eq!(run.handle.next_block(), 101);

    serve_chain(&mut node, 102);
    assert_eq!(next_blocks(&mut run, 2).await, vec![101, 102]);
    stop(run).await;
}

#[tokio::test]
async fn test_ingestion_with_unreliable_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cursor.json");
    FileCheckpoint::new(&path).save(100).await.unwrap();

    let silent = SilentNode::bind();
    let mut lagging = RpcMockBuilder::new().await;
    lagging.mock_block_number(50);
    let mut healthy = RpcMockBuilder::new().await;
    serve_chain(&mut healthy, 105);

    // The healthy node is configured twice so it holds the median.
    let rpc = RpcConfig { height_timeout_ms: 200, request_timeout_ms: 200, ..fast_rpc_config() };
    let provider = provider_for(&[silent.url(), lagging.url(), healthy.url(), healthy.url()], rpc);

    let mut run = start_with(provider, &path, ingest_config()).await;
    assert_eq!(next_blocks(&mut run, 5).await, vec![101, 102, 103, 104, 105]);
    stop(run).await;

    assert_eq!(FileCheckpoint::new(&path).load().await.unwrap(), Some(105));
}

#[tokio::test]
async fn test_ingestion_with_timeout_lagging_and_healthy_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cursor.json");
    FileCheckpoint::new(&path).save(100).await.unwrap();

    let silent = SilentNode::bind();
    let mut lagging = RpcMockBuilder::new().await;
    lagging.mock_block_number(103);
    let mut healthy = RpcMockBuilder::new().await;
    serve_chain(&mut healthy, 105);

    // 103 and 105 fall inside the consensus window, so the height is 105.
    let rpc = RpcConfig { height_timeout_ms: 200, request_timeout_ms: 200, ..fast_rpc_config() };
    let provider = provider_for(&[silent.url(), lagging.url(), healthy.url()], rpc);

    let mut run = start_with(provider, &path, ingest_config()).await;
    assert_eq!(next_blocks(&mut run, 5).await, vec![101, 102, 103, 104, 105]);
    stop(run).await;

    assert_eq!(FileCheckpoint::new(&path).load().await.unwrap(), Some(105));
}

#[tokio::test]
async fn test_full_block_with_undecodable_transaction_is_delivered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cursor.json");
    FileCheckpoint::new(&path).save(100).await.unwrap();

    let mut block = create_test_block(101, 3);
    let broken = block["transactions"][1].as_object_mut().unwrap();
    broken.remove("maxFeePerGas");
    broken.remove("maxPriorityFeePerGas");

    let mut node = RpcMockBuilder::new().await;
    node.mock_block_number(101).mock_get_block_by_number(101, &block);

    let config = IngestConfig { full_transactions: true, ..ingest_config() };
    let mut run =
        start_with(provider_for(&[node.url()], fast_rpc_config()), &path, config).await;
    assert_eq!(next_blocks(&mut run, 1).await, vec![101]);

    let Run { handle, mut transactions, .. } = run;
    handle.stop();
    handle.join().await.unwrap();

    let mut hashes = Vec::new();
    while let Ok(event) = transactions.try_recv() {
        hashes.push(event.transaction.hash);
    }
    assert_eq!(hashes, vec![tx_hash(101, 0), tx_hash(101, 2)]);
    assert_eq!(FileCheckpoint::new(&path).load().await.unwrap(), Some(101));
}
