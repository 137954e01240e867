use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When the checkpoint is written relative to announcing a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOrder {
    /// Persist, then announce. A crash in between loses that block's events
    /// (at-most-once delivery).
    #[default]
    BeforeAnnounce,
    /// Announce, then persist. A crash in between re-announces the block on
    /// restart (at-least-once delivery).
    AfterAnnounce,
}

/// Block ingestion loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Attempts per block fetch before the block is left for the next iteration.
    pub max_fetch_attempts: u32,

    /// Delay between fetch attempts in milliseconds.
    pub retry_delay_ms: u64,

    /// Blocks fetched in parallel per batch. Also bounds the pending buffer.
    pub batch_size: usize,

    /// Maximum lag (in blocks) replayed after a restart before fast-forwarding.
    pub replay_window: u64,

    /// Delay between iterations in milliseconds.
    pub poll_interval_ms: u64,

    /// Concurrent `eth_getTransactionByHash` lookups when a block only lists hashes.
    pub tx_fetch_concurrency: usize,

    /// Request full transaction objects with each block.
    pub full_transactions: bool,

    pub commit_order: CommitOrder,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_fetch_attempts: 3,
            retry_delay_ms: 1000,
            batch_size: 5,
            replay_window: 10,
            poll_interval_ms: 1000,
            tx_fetch_concurrency: 8,
            full_transactions: true,
            commit_order: CommitOrder::BeforeAnnounce,
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// # Errors
    ///
    /// Returns a descriptive error string for zero attempts, batch size,
    /// poll interval or fetch concurrency.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_fetch_attempts == 0 {
            return Err("Ingest max_fetch_attempts must be greater than 0".to_string());
        }
        if self.batch_size == 0 {
            return Err("Ingest batch_size must be greater than 0".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("Ingest poll_interval_ms must be greater than 0".to_string());
        }
        if self.tx_fetch_concurrency == 0 {
            return Err("Ingest tx_fetch_concurrency must be greater than 0".to_string());
        }
        Ok(())
    }
}
