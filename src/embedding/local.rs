//! Local embeddings via fastembed (ONNX, runs on CPU).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use super::{EmbeddingError, EmbeddingGenerator, EmbeddingResult};

/// Embedding generator backed by a single in-process fastembed model.
///
/// Inference runs on the blocking pool; calls are serialized on the model.
pub struct FastEmbedGenerator {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimensions: usize,
}

impl FastEmbedGenerator {
    /// Load (downloading on first use) the named model.
    pub fn new(
        model_name: &str,
        cache_dir: Option<PathBuf>,
        show_download_progress: bool,
    ) -> EmbeddingResult<Self> {
        let model = parse_model(model_name).ok_or_else(|| {
            EmbeddingError::Config(format!(
                "unknown fastembed model '{model_name}' (expected one of: {})",
                SUPPORTED_MODELS
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        let mut options = InitOptions::new(model).with_show_download_progress(show_download_progress);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let mut text_model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::Model(format!("failed to load model: {e}")))?;

        // Get dimensions by generating a test embedding
        let probe = text_model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::Model(e.to_string()))?;
        let dimensions = probe.first().map(Vec::len).unwrap_or_default();

        tracing::info!(
            target: "embedding",
            "loaded fastembed model {model_name} ({dimensions} dimensions)"
        );

        Ok(Self {
            model: Arc::new(Mutex::new(text_model)),
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl EmbeddingGenerator for FastEmbedGenerator {
    async fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let model = Arc::clone(&self.model);
        let vectors = tokio::task::spawn_blocking(move || model.lock().embed(owned, None))
            .await
            .map_err(|e| EmbeddingError::Model(format!("embedding task failed: {e}")))?
            .map_err(|e| EmbeddingError::Model(e.to_string()))?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

const SUPPORTED_MODELS: &[(&str, EmbeddingModel)] = &[
    ("AllMiniLML6V2", EmbeddingModel::AllMiniLML6V2),
    ("AllMiniLML12V2", EmbeddingModel::AllMiniLML12V2),
    ("BGESmallENV15", EmbeddingModel::BGESmallENV15),
    ("BGEBaseENV15", EmbeddingModel::BGEBaseENV15),
    ("BGELargeENV15", EmbeddingModel::BGELargeENV15),
    ("MultilingualE5Small", EmbeddingModel::MultilingualE5Small),
    ("MultilingualE5Base", EmbeddingModel::MultilingualE5Base),
    ("NomicEmbedTextV15", EmbeddingModel::NomicEmbedTextV15),
];

/// Resolve a model name, ignoring case and `-`/`_`/`.` separators.
fn parse_model(name: &str) -> Option<EmbeddingModel> {
    let wanted = squash(name);
    SUPPORTED_MODELS
        .iter()
        .find(|(known, _)| squash(known) == wanted)
        .map(|(_, model)| model.clone())
}

fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | '.' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}
