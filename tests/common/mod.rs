//! Shared fixtures: an in-memory extractor and a deterministic embedder.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tempfile::TempDir;

use pdfrag::RagEngine;
use pdfrag::documents::{ChunkingConfig, DocumentName, ExtractionError, TextExtractor};
use pdfrag::embedding::{EmbeddingError, EmbeddingGenerator, EmbeddingResult};
use pdfrag::store::CollectionStore;

pub const VOCABULARY: &[&str] = &[
    "rust",
    "systems",
    "programming",
    "language",
    "sky",
    "blue",
    "color",
    "bananas",
    "yellow",
    "grow",
    "bunches",
];

pub const SAMPLE_TEXT: &str = "Rust is a systems programming language.\n\nThe sky is blue.\n\nBananas are yellow and grow in bunches.";

/// Documents held in memory, keyed by normalized name.
#[derive(Default)]
pub struct MemoryExtractor {
    documents: RwLock<HashMap<String, String>>,
}

impl MemoryExtractor {
    pub fn with(name: &str, text: &str) -> Self {
        let extractor = Self::default();
        extractor.insert(name, text);
        extractor
    }

    pub fn insert(&self, name: &str, text: &str) {
        let name = DocumentName::new(name).unwrap();
        self.documents
            .write()
            .insert(name.as_str().to_string(), text.to_string());
    }
}

#[async_trait]
impl TextExtractor for MemoryExtractor {
    async fn extract(&self, name: &DocumentName) -> Result<String, ExtractionError> {
        self.documents
            .read()
            .get(name.as_str())
            .map(|text| text.trim().to_string())
            .ok_or_else(|| ExtractionError::NotFound(PathBuf::from(name.as_str())))
    }
}

/// Bag-of-words over a fixed vocabulary, one dimension per word.
#[derive(Default)]
pub struct VocabEmbedder {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl VocabEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; VOCABULARY.len()];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            if let Some(i) = VOCABULARY.iter().position(|v| *v == word) {
                vector[i] += 1.0;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingGenerator for VocabEmbedder {
    async fn generate_embeddings(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Service {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(texts.iter().map(|text| Self::vector(text)).collect())
    }

    fn model_name(&self) -> &str {
        "vocab-test"
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub extractor: Arc<MemoryExtractor>,
    pub embedder: Arc<VocabEmbedder>,
    pub store: Arc<CollectionStore>,
    pub engine: RagEngine,
}

impl Fixture {
    pub fn new(chunking: ChunkingConfig, top_k: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let extractor = Arc::new(MemoryExtractor::with("sample.pdf", SAMPLE_TEXT));
        let embedder = Arc::new(VocabEmbedder::default());
        let store = Arc::new(CollectionStore::open(dir.path().join("store")).unwrap());
        let engine = RagEngine::new(
            Arc::clone(&extractor) as Arc<dyn TextExtractor>,
            chunking,
            Arc::clone(&embedder) as Arc<dyn EmbeddingGenerator>,
            Arc::clone(&store),
            top_k,
        )
        .unwrap();

        Self {
            dir,
            extractor,
            embedder,
            store,
            engine,
        }
    }

    /// Small chunks so the sample splits into several entries.
    pub fn small() -> Self {
        Self::new(ChunkingConfig::new(60, 10), 3)
    }
}

pub fn name(raw: &str) -> DocumentName {
    DocumentName::new(raw).unwrap()
}
