//! Sequential block ingestion.
//!
//! One iteration:
//!
//! ```text
//! height ──► [height < cursor?] ── yes ──► done
//!               │ no
//!               ▼
//!    fetch batch [cursor, cursor + batch) in parallel (retries per block)
//!               │
//!               ▼
//!    drain: while pending holds cursor ─► normalize txs ─► checkpoint ─► announce ─► cursor += 1
//!               │
//!               ├─ gap left ─► done (missing block refetched next iteration)
//!               └─ caught up with batch ─► next batch until height
//! ```
//!
//! Iterations never overlap: the loop state sits behind one async mutex that
//! the supervisor task holds for the whole iteration.

use futures_util::{future::join_all, stream, FutureExt, StreamExt};
use std::{
    any::Any,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::{
    sync::{watch, Mutex},
    task::{JoinError, JoinHandle},
};
use tracing::{debug, info, warn};

use super::{
    checkpoint::CheckpointStore,
    config::{CommitOrder, IngestConfig},
    error::IngestError,
    events::{BlockEvent, EventBus, TransactionEvent, TxSource},
    pending::PendingBuffer,
    recent::{RecencySet, RECENT_BLOCKS_CAP, RECENT_TRANSACTIONS_CAP},
};
use crate::{
    chain::{BlockRecord, BlockTransactions},
    provider::ChainProvider,
    utils::BlockId,
};

/// Configures and starts the ingestion loop.
///
/// Listeners can be registered on [`BlockIngestor::events`] before
/// [`BlockIngestor::start`] so that no event is missed.
pub struct BlockIngestor {
    provider: Arc<dyn ChainProvider>,
    checkpoint: Arc<dyn CheckpointStore>,
    config: IngestConfig,
    events: Arc<EventBus>,
}

impl BlockIngestor {
    #[must_use]
    pub fn new(
        provider: Arc<dyn ChainProvider>,
        checkpoint: Arc<dyn CheckpointStore>,
        config: IngestConfig,
    ) -> Self {
        Self { provider, checkpoint, config, events: Arc::new(EventBus::new()) }
    }

    #[must_use]
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Restores the cursor and spawns the loop on the current tokio runtime.
    ///
    /// Startup policy, with `H` the current trusted height:
    /// - no checkpoint: `H` is recorded as processed, delivery starts at `H + 1`
    /// - checkpoint `C` with `H - C > replay_window`: fast-forward, delivery
    ///   starts at `H - replay_window + 1`
    /// - otherwise delivery resumes at `C + 1`
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] if the height or the checkpoint cannot be read or
    /// the seeded checkpoint cannot be written.
    pub async fn start(self) -> Result<IngestorHandle, IngestError> {
        let ingest = self.initialize().await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(supervise(Arc::clone(&ingest), shutdown_rx));

        Ok(IngestorHandle { ingest, shutdown: shutdown_tx, task })
    }

    async fn initialize(self) -> Result<Arc<IngestLoop>, IngestError> {
        let height = self.provider.block_number().await?;
        let window = self.config.replay_window;

        let last_processed = match self.checkpoint.load().await? {
            None => {
                self.checkpoint.save(height).await?;
                info!(height, "no checkpoint, starting at chain head");
                height
            }
            Some(saved) if height.saturating_sub(saved) > window => {
                let resume_from = height - window;
                self.checkpoint.save(resume_from).await?;
                warn!(
                    checkpoint = saved,
                    height,
                    skipped = resume_from - saved,
                    "checkpoint outside replay window, fast-forwarding"
                );
                resume_from
            }
            Some(saved) => {
                info!(checkpoint = saved, height, "resuming from checkpoint");
                saved
            }
        };

        let next_block = last_processed + 1;
        Ok(Arc::new(IngestLoop {
            provider: self.provider,
            checkpoint: self.checkpoint,
            config: self.config,
            events: self.events,
            next_block: AtomicU64::new(next_block),
            state: Mutex::new(LoopState {
                next_block,
                pending: PendingBuffer::new(),
                recent_blocks: RecencySet::new(RECENT_BLOCKS_CAP),
                recent_transactions: RecencySet::new(RECENT_TRANSACTIONS_CAP),
            }),
        }))
    }
}

/// Control handle of a running ingestion loop.
///
/// Dropping the handle without calling [`IngestorHandle::stop`] also ends the
/// loop after the current iteration.
pub struct IngestorHandle {
    ingest: Arc<IngestLoop>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl IngestorHandle {
    #[must_use]
    pub fn events(&self) -> &Arc<EventBus> {
        &self.ingest.events
    }

    /// Next block the loop will announce.
    #[must_use]
    pub fn next_block(&self) -> u64 {
        self.ingest.next_block.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn last_processed(&self) -> u64 {
        self.next_block().saturating_sub(1)
    }

    /// Moves the cursor so that delivery continues at `last_processed + 1`.
    ///
    /// Waits for an in-flight iteration, persists the new position and drops
    /// prefetched blocks.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Checkpoint`] if the position cannot be saved; the
    /// cursor is left unchanged in that case.
    pub async fn reset_cursor(&self, last_processed: u64) -> Result<(), IngestError> {
        let mut state = self.ingest.state.lock().await;
        self.ingest.checkpoint.save(last_processed).await?;
        state.pending.clear();
        self.ingest.advance(&mut state, last_processed + 1);
        info!(block = last_processed + 1, "cursor reset");
        Ok(())
    }

    /// Signals the loop to stop and detaches all listeners. An in-flight
    /// iteration finishes, but its remaining events go nowhere.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
        self.ingest.events.clear();
        info!("ingestion stop requested");
    }

    /// Waits for the loop task to finish.
    ///
    /// # Errors
    ///
    /// Returns the task's [`JoinError`] if it was aborted.
    pub async fn join(self) -> Result<(), JoinError> {
        self.task.await
    }
}

struct LoopState {
    next_block: u64,
    pending: PendingBuffer,
    recent_blocks: RecencySet<u64>,
    recent_transactions: RecencySet<String>,
}

struct IngestLoop {
    provider: Arc<dyn ChainProvider>,
    checkpoint: Arc<dyn CheckpointStore>,
    config: IngestConfig,
    events: Arc<EventBus>,
    /// Mirror of `LoopState::next_block` readable without the lock.
    next_block: AtomicU64,
    state: Mutex<LoopState>,
}

async fn supervise(ingest: Arc<IngestLoop>, mut shutdown: watch::Receiver<bool>) {
    info!(next_block = ingest.next_block.load(Ordering::Acquire), "ingestion loop started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        match AssertUnwindSafe(ingest.run_iteration()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => ingest.report(&e),
            Err(panic) => ingest.report(&IngestError::IterationPanicked(panic_message(&*panic))),
        }

        tokio::select! {
            () = tokio::time::sleep(ingest.config.poll_interval()) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(next_block = ingest.next_block.load(Ordering::Acquire), "ingestion loop stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

impl IngestLoop {
    fn report(&self, error: &IngestError) {
        warn!(error = %error, error_kind = error.kind(), "ingestion iteration failed");
        self.events.emit_error(error);
    }

    fn advance(&self, state: &mut LoopState, next_block: u64) {
        state.next_block = next_block;
        self.next_block.store(next_block, Ordering::Release);
    }

    async fn run_iteration(&self) -> Result<(), IngestError> {
        let mut state = self.state.lock().await;
        let height = self.provider.block_number().await?;

        if height < state.next_block {
            debug!(height, next_block = state.next_block, "no new blocks");
            return Ok(());
        }

        let cursor = state.next_block;
        state.pending.discard_below(cursor);

        let batch_size = self.config.batch_size.max(1) as u64;
        let mut batch_start = cursor;
        while batch_start <= height {
            let batch_end = batch_start.saturating_add(batch_size - 1).min(height);
            let wanted: Vec<u64> =
                (batch_start..=batch_end).filter(|n| !state.pending.contains(*n)).collect();

            debug!(from = batch_start, to = batch_end, fetching = wanted.len(), "fetching batch");
            let fetched = join_all(wanted.into_iter().map(|n| self.fetch_block(n))).await;
            for block in fetched.into_iter().flatten() {
                state.pending.insert(block);
            }

            self.drain(&mut state).await?;

            if state.next_block <= batch_end {
                debug!(
                    missing = state.next_block,
                    buffered = state.pending.len(),
                    "gap in fetched blocks, ending iteration"
                );
                break;
            }
            batch_start = batch_end + 1;
        }

        Ok(())
    }

    /// Fetches one sealed block, retrying up to `max_fetch_attempts` times.
    /// Errors that cannot clear on retry end the attempts early.
    async fn fetch_block(&self, number: u64) -> Option<BlockRecord> {
        let attempts = self.config.max_fetch_attempts;
        for attempt in 1..=attempts {
            match self.provider.block(BlockId::Number(number), self.config.full_transactions).await {
                Ok(block) if block.is_sealed() && block.number == number => return Some(block),
                Ok(block) => debug!(
                    block = number,
                    returned = block.number,
                    attempt,
                    "block not sealed or mismatched"
                ),
                Err(e) if !e.is_transient() => {
                    warn!(
                        block = number,
                        attempt,
                        error = %e,
                        error_kind = e.kind(),
                        "block fetch failed permanently, retrying next iteration"
                    );
                    return None;
                }
                Err(e) => debug!(block = number, attempt, error = %e, "block fetch failed"),
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_delay()).await;
            }
        }

        warn!(block = number, attempts, "block fetch exhausted, retrying next iteration");
        None
    }

    async fn drain(&self, state: &mut LoopState) -> Result<(), IngestError> {
        while let Some(block) = state.pending.pop_next(state.next_block) {
            let number = block.number;
            let block = self.normalize(block).await;

            match self.config.commit_order {
                CommitOrder::BeforeAnnounce => {
                    self.checkpoint.save(number).await?;
                    self.announce(state, block);
                }
                CommitOrder::AfterAnnounce => {
                    self.announce(state, block);
                    self.checkpoint.save(number).await?;
                }
            }

            self.advance(state, number + 1);
        }
        Ok(())
    }

    /// Replaces bare transaction hashes with fetched objects, in block order.
    /// Transactions that cannot be fetched are dropped.
    async fn normalize(&self, mut block: BlockRecord) -> BlockRecord {
        let hashes = match &mut block.transactions {
            BlockTransactions::Hashes(hashes) => std::mem::take(hashes),
            BlockTransactions::Full(_) => return block,
        };

        let fetched: Vec<_> = stream::iter(hashes)
            .map(|hash| async move {
                match self.provider.transaction(&hash).await {
                    Ok(tx) => Some(tx),
                    Err(e) => {
                        debug!(tx = %hash, error = %e, "dropping unavailable transaction");
                        None
                    }
                }
            })
            .buffered(self.config.tx_fetch_concurrency.max(1))
            .collect()
            .await;

        block.transactions = BlockTransactions::Full(fetched.into_iter().flatten().collect());
        block
    }

    fn announce(&self, state: &mut LoopState, block: BlockRecord) {
        let number = block.number;
        let tx_count = block.transactions.len();

        if state.recent_blocks.insert(number) {
            info!(block = number, txs = tx_count, "new block");
        } else {
            debug!(block = number, "block announced again");
        }

        let event = BlockEvent { block };
        self.events.emit_block(&event);

        if let BlockTransactions::Full(transactions) = &event.block.transactions {
            for (index, transaction) in transactions.iter().enumerate() {
                if !state.recent_transactions.insert(transaction.hash.clone()) {
                    continue;
                }
                self.events.emit_transaction(&TransactionEvent {
                    transaction: transaction.clone(),
                    source: TxSource {
                        block_number: number,
                        block_hash: event.block.hash.clone(),
                        index,
                    },
                });
            }
        }
    }
}
