//! Embedding generation.
//!
//! One trait, three providers:
//! - `gemini`: Google Generative Language `batchEmbedContents` (default)
//! - `openai`: any OpenAI-compatible `/embeddings` endpoint
//! - `fastembed`: local ONNX model, no network
//!
//! Indexing and querying must use the same provider and model. Nothing
//! enforces this; vectors from different models are silently incomparable.

mod gemini;
mod http;
mod local;
mod openai;

pub use gemini::GeminiEmbedder;
pub use local::FastEmbedGenerator;
pub use openai::OpenAiEmbedder;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{EmbeddingConfig, EmbeddingProvider};

/// Errors from embedding generation.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding configuration error: {0}")]
    Config(String),

    #[error("Embedding transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Embedding service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Embedding model error: {0}")]
    Model(String),
}

impl EmbeddingError {
    /// Whether retrying the whole call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Service { .. })
    }
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Maps text to fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    /// Embed a batch of document texts, one vector per input, in input order.
    async fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Embed a search query.
    ///
    /// Providers with asymmetric retrieval modes override this.
    async fn embed_query(&self, query: &str) -> EmbeddingResult<Vec<f32>> {
        let vectors = self.generate_embeddings(&[query]).await?;
        single_vector(vectors)
    }

    /// Identifier of the model producing the vectors.
    fn model_name(&self) -> &str;
}

pub(crate) fn single_vector(vectors: Vec<Vec<f32>>) -> EmbeddingResult<Vec<f32>> {
    let actual = vectors.len();
    match <[Vec<f32>; 1]>::try_from(vectors) {
        Ok([vector]) => Ok(vector),
        Err(_) => Err(EmbeddingError::CountMismatch {
            expected: 1,
            actual,
        }),
    }
}

/// Build the configured embedding provider.
pub fn from_config(config: &EmbeddingConfig) -> EmbeddingResult<Arc<dyn EmbeddingGenerator>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let model = config.effective_model();

    let generator: Arc<dyn EmbeddingGenerator> = match config.provider {
        EmbeddingProvider::Gemini => Arc::new(GeminiEmbedder::new(
            read_api_key(config)?,
            config.effective_base_url(),
            model,
            config.dimensions,
            timeout,
            config.max_retries,
            config.batch_size,
        )?),
        EmbeddingProvider::Openai => Arc::new(OpenAiEmbedder::new(
            read_api_key(config)?,
            config.effective_base_url(),
            model,
            config.dimensions,
            timeout,
            config.max_retries,
            config.batch_size,
        )?),
        EmbeddingProvider::Fastembed => Arc::new(FastEmbedGenerator::new(
            &model,
            config.cache_dir.clone(),
            false,
        )?),
    };

    tracing::info!(
        target: "embedding",
        "using {:?} embeddings with model {}",
        config.provider,
        generator.model_name()
    );
    Ok(generator)
}

fn read_api_key(config: &EmbeddingConfig) -> EmbeddingResult<String> {
    let var = config.effective_api_key_env();
    match std::env::var(&var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(EmbeddingError::Config(format!(
            "missing API key: set the {var} environment variable"
        ))),
    }
}
