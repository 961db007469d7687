use thiserror::Error;

use crate::documents::{ChunkingError, ExtractionError};
use crate::embedding::EmbeddingError;
use crate::store::StorageError;

/// Any failure of the index or query path.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Chunking(#[from] ChunkingError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PipelineError {
    /// True only for transient embedding service failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Embedding(e) if e.is_retryable())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
