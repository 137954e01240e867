//! Persistence of the last processed block.
//!
//! The ingestion loop is the only writer. Stores hold a single integer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt checkpoint: {0}")]
    Corrupt(String),
}

/// Where the ingestion loop records progress.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Returns the last processed block, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<u64>, CheckpointError>;

    async fn save(&self, last_block: u64) -> Result<(), CheckpointError>;
}

/// Process-local store. Progress is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCheckpoint {
    last_block: Mutex<Option<u64>>,
}

impl MemoryCheckpoint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an already processed block.
    #[must_use]
    pub fn starting_at(last_block: u64) -> Self {
        Self { last_block: Mutex::new(Some(last_block)) }
    }

    /// Synchronous read of the stored value.
    #[must_use]
    pub fn get(&self) -> Option<u64> {
        *self.last_block.lock()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpoint {
    async fn load(&self) -> Result<Option<u64>, CheckpointError> {
        Ok(self.get())
    }

    async fn save(&self, last_block: u64) -> Result<(), CheckpointError> {
        *self.last_block.lock() = Some(last_block);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    last_block: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// JSON file store: `{ "last_block": n, "updated_at": "..." }`.
///
/// Writes go to a sibling temp file which is then renamed over the target, so
/// a crash mid-write leaves the previous checkpoint intact.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpoint {
    async fn load(&self) -> Result<Option<u64>, CheckpointError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: CheckpointFile = serde_json::from_slice(&bytes)
            .map_err(|e| CheckpointError::Corrupt(format!("{}: {e}", self.path.display())))?;
        Ok(Some(file.last_block))
    }

    async fn save(&self, last_block: u64) -> Result<(), CheckpointError> {
        let body = serde_json::to_vec(&CheckpointFile { last_block, updated_at: Some(Utc::now()) })
            .map_err(|e| CheckpointError::Corrupt(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, body).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        debug!(block = last_block, path = %self.path.display(), "checkpoint saved");
        Ok(())
    }
}
