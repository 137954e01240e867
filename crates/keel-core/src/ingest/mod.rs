//! Sequential block ingestion with a persisted cursor.
//!
//! [`BlockIngestor`] polls the trusted height, fetches blocks in parallel
//! batches and announces them strictly in ascending order, each exactly once
//! per run. The cursor is persisted through a [`CheckpointStore`] so a restart
//! resumes where the previous run stopped, bounded by the replay window.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod events;
pub mod ingestor;
pub mod pending;
pub mod recent;

pub use checkpoint::{CheckpointError, CheckpointStore, FileCheckpoint, MemoryCheckpoint};
pub use config::{CommitOrder, IngestConfig};
pub use error::IngestError;
pub use events::{BlockEvent, EventBus, ListenerId, TransactionEvent, TxSource};
pub use ingestor::{BlockIngestor, IngestorHandle};
