use thiserror::Error;

use super::checkpoint::CheckpointError;
use crate::upstream::UpstreamError;

/// Non-fatal failure of one ingestion iteration. Reported through the error
/// listeners; the loop keeps running.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("ingestion iteration panicked: {0}")]
    IterationPanicked(String),
}

impl IngestError {
    /// Short label for structured log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upstream(e) => e.kind(),
            Self::Checkpoint(_) => "checkpoint",
            Self::IterationPanicked(_) => "panic",
        }
    }
}
