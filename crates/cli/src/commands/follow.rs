use keel_core::{
    config::AppConfig,
    ingest::{BlockIngestor, CheckpointStore, FileCheckpoint, MemoryCheckpoint},
    provider::{ChainProvider, ResilientProvider},
};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::Notify;
use tracing::{info, warn};

use super::utils::{print_info, CliResult};

/// Output of `follow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutput {
    /// One line per block.
    Summary,
    /// One line per block and per transaction.
    Transactions,
}

/// Runs the ingestion loop until Ctrl-C or until `limit` blocks were seen.
pub async fn follow(
    config: &AppConfig,
    provider: ResilientProvider,
    output: FollowOutput,
    limit: Option<u64>,
) -> CliResult<()> {
    let checkpoint: Arc<dyn CheckpointStore> = match &config.checkpoint.path {
        Some(path) => {
            print_info(&format!("Using checkpoint file {path}"));
            Arc::new(FileCheckpoint::new(path))
        }
        None => {
            print_info("No checkpoint path configured, cursor is kept in memory");
            Arc::new(MemoryCheckpoint::new())
        }
    };

    let provider: Arc<dyn ChainProvider> = Arc::new(provider);
    let ingestor = BlockIngestor::new(provider, checkpoint, config.ingest.clone());

    let seen = Arc::new(AtomicU64::new(0));
    let done = Arc::new(Notify::new());

    let counter = Arc::clone(&seen);
    let notify = Arc::clone(&done);
    ingestor.events().on_block(move |event| {
        let block = &event.block;
        println!(
            "block {} hash={} txs={}",
            block.number,
            block.hash.as_deref().unwrap_or("-"),
            block.transactions.len()
        );
        let total = counter.fetch_add(1, Ordering::Relaxed) + 1;
        if limit.is_some_and(|limit| total >= limit) {
            notify.notify_one();
        }
    });

    if output == FollowOutput::Transactions {
        ingestor.events().on_transaction(|event| {
            println!(
                "  tx {} block={} index={} from={} to={}",
                event.transaction.hash,
                event.source.block_number,
                event.source.index,
                event.transaction.from,
                event.transaction.to.as_deref().unwrap_or("(create)")
            );
        });
    }

    ingestor.events().on_error(|error| {
        warn!(error = %error, kind = error.kind(), "ingestion error");
    });

    let handle = ingestor.start().await?;
    info!(next_block = handle.next_block(), "following chain");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
        () = done.notified() => info!(blocks = seen.load(Ordering::Relaxed), "block limit reached"),
    }

    handle.stop();
    let last_processed = handle.last_processed();
    if let Err(e) = handle.join().await {
        warn!(error = %e, "ingestion task ended abnormally");
    }
    print_info(&format!("Stopped after block {last_processed}"));

    Ok(())
}
