//! Indexing coordinator.
//!
//! ```text
//! EXTRACT → CHUNK → EMBED → ADD
//!    │        │       │      │
//!    ▼        ▼       ▼      ▼
//!  [text] [chunks] [vectors] collection (one commit)
//! ```
//!
//! Every chunk of a call is embedded before the single `add`, so a failure at
//! any stage leaves the collection exactly as it was.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::PipelineResult;
use super::store_task;
use crate::documents::{Chunker, DocumentName, TextExtractor};
use crate::embedding::{EmbeddingError, EmbeddingGenerator};
use crate::store::{CollectionStore, Entry};

/// Result of one indexing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub document: DocumentName,
    /// Chunks written by this run.
    pub chunks: usize,
    /// Collection size after the run.
    pub entries_after: usize,
}

/// Result of [`IndexingCoordinator::index_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    Indexed(IndexReport),
    AlreadyIndexed { entries: usize },
}

/// Per-document async locks.
///
/// Entries are never removed; the table grows with the number of distinct
/// documents seen by the process.
#[derive(Debug, Default)]
pub struct DocumentLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `name`.
    pub async fn acquire(&self, name: &DocumentName) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(&self.locks.entry(name.as_str().to_string()).or_default());
        lock.lock_owned().await
    }
}

/// Drives documents through extract, chunk, embed and store.
pub struct IndexingCoordinator {
    extractor: Arc<dyn TextExtractor>,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingGenerator>,
    store: Arc<CollectionStore>,
    locks: DocumentLocks,
}

impl IndexingCoordinator {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        chunker: Arc<dyn Chunker>,
        embedder: Arc<dyn EmbeddingGenerator>,
        store: Arc<CollectionStore>,
    ) -> Self {
        Self {
            extractor,
            chunker,
            embedder,
            store,
            locks: DocumentLocks::new(),
        }
    }

    /// Whether the document's collection holds at least one entry.
    pub fn is_indexed(&self, name: &DocumentName) -> PipelineResult<bool> {
        Ok(self.entry_count(name)? > 0)
    }

    pub fn entry_count(&self, name: &DocumentName) -> PipelineResult<usize> {
        Ok(self.store.count(name.as_str())?)
    }

    /// Index the document, appending to any existing entries.
    ///
    /// Calling this twice stores every chunk twice.
    pub async fn index(&self, name: &DocumentName) -> PipelineResult<IndexReport> {
        let _guard = self.locks.acquire(name).await;
        self.index_locked(name).await
    }

    /// Index the document unless its collection already has entries.
    ///
    /// The check and the write happen under the document's lock, so
    /// concurrent callers index at most once.
    pub async fn index_if_absent(&self, name: &DocumentName) -> PipelineResult<IndexOutcome> {
        let _guard = self.locks.acquire(name).await;

        let entries = self.entry_count(name)?;
        if entries > 0 {
            tracing::debug!(target: "indexing", "{name} already indexed ({entries} entries)");
            return Ok(IndexOutcome::AlreadyIndexed { entries });
        }

        self.index_locked(name).await.map(IndexOutcome::Indexed)
    }

    async fn index_locked(&self, name: &DocumentName) -> PipelineResult<IndexReport> {
        let started = Instant::now();

        let text = self.extractor.extract(name).await?;
        let chunks = self.chunker.chunk(&text);
        tracing::debug!(
            target: "indexing",
            "{name}: {} chars in {} chunks",
            text.chars().count(),
            chunks.len()
        );

        if chunks.is_empty() {
            tracing::warn!(target: "indexing", "{name} has no extractable text, nothing indexed");
            return Ok(IndexReport {
                document: name.clone(),
                chunks: 0,
                entries_after: self.entry_count(name)?,
            });
        }

        let texts: Vec<&str> = chunks.iter().map(|chunk| chunk.content).collect();
        let vectors = self.embedder.generate_embeddings(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            }
            .into());
        }

        let entries: Vec<Entry> = texts
            .iter()
            .zip(vectors)
            .map(|(text, vector)| Entry::new(*text, vector))
            .collect();

        let collection = name.as_str().to_string();
        let (written, entries_after) = store_task(&self.store, move |store| {
            store.open_or_create(&collection)?;
            let written = store.add(&collection, entries)?;
            Ok((written, store.count(&collection)?))
        })
        .await?;

        tracing::info!(
            target: "indexing",
            "indexed {name}: {written} chunks with {} in {:.2?} ({entries_after} entries total)",
            self.embedder.model_name(),
            started.elapsed()
        );

        Ok(IndexReport {
            document: name.clone(),
            chunks: written,
            entries_after,
        })
    }
}
