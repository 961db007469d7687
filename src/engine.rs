//! The assembled pipeline and its string-in, string-out surface.
//!
//! `RagEngine` is what the MCP server and the CLI talk to. Every operation
//! takes the document name explicitly.

use std::sync::Arc;

use crate::config::Settings;
use crate::documents::{
    Chunker, ChunkingConfig, DocumentName, PdfExtractor, RecursiveChunker, TextExtractor,
};
use crate::embedding::{self, EmbeddingGenerator};
use crate::indexing::{
    IndexOutcome, IndexReport, IndexingCoordinator, PipelineResult, RetrievalResult, Retriever,
};
use crate::store::CollectionStore;

pub struct RagEngine {
    extractor: Arc<dyn TextExtractor>,
    store: Arc<CollectionStore>,
    coordinator: IndexingCoordinator,
    retriever: Retriever,
}

impl RagEngine {
    /// Wire the pipeline from its parts.
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        chunking: ChunkingConfig,
        embedder: Arc<dyn EmbeddingGenerator>,
        store: Arc<CollectionStore>,
        top_k: usize,
    ) -> PipelineResult<Self> {
        let chunker: Arc<dyn Chunker> = Arc::new(RecursiveChunker::new(chunking)?);
        let coordinator = IndexingCoordinator::new(
            Arc::clone(&extractor),
            chunker,
            Arc::clone(&embedder),
            Arc::clone(&store),
        );
        let retriever = Retriever::new(embedder, Arc::clone(&store), top_k);

        Ok(Self {
            extractor,
            store,
            coordinator,
            retriever,
        })
    }

    /// Build the engine described by `settings`: PDF extractor over the
    /// documents directory, configured embedding provider, store on disk.
    pub fn from_settings(settings: &Settings) -> PipelineResult<Self> {
        let documents_dir = settings.resolved_documents_dir();
        let store_path = settings.resolved_store_path();

        let mut embedding_config = settings.embedding.clone();
        embedding_config.cache_dir = embedding_config.effective_cache_dir();
        let embedder = embedding::from_config(&embedding_config)?;

        let store = Arc::new(CollectionStore::open(&store_path)?);
        tracing::info!(
            target: "engine",
            "documents in {}, store at {}",
            documents_dir.display(),
            store_path.display()
        );

        Self::new(
            Arc::new(PdfExtractor::new(documents_dir)),
            settings.chunking.clone(),
            embedder,
            store,
            settings.retrieval.top_k,
        )
    }

    pub fn coordinator(&self) -> &IndexingCoordinator {
        &self.coordinator
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    /// `"true"` when the document has stored chunks, otherwise `"false"`.
    pub fn is_indexed(&self, name: &str) -> PipelineResult<String> {
        let name = DocumentName::new(name)?;
        Ok(self.coordinator.is_indexed(&name)?.to_string())
    }

    /// Index the document once; later calls report it as already indexed.
    pub async fn chunks(&self, name: &str) -> PipelineResult<String> {
        let name = DocumentName::new(name)?;
        let message = match self.coordinator.index_if_absent(&name).await? {
            IndexOutcome::Indexed(report) => indexed_message(&report),
            IndexOutcome::AlreadyIndexed { entries } => {
                format!("Document '{name}' is already indexed ({entries} chunks stored).")
            }
        };
        Ok(message)
    }

    /// Index the document again, appending to what is stored.
    pub async fn reindex(&self, name: &str) -> PipelineResult<String> {
        let name = DocumentName::new(name)?;
        let report = self.coordinator.index(&name).await?;
        Ok(indexed_message(&report))
    }

    /// Answer `query` with the configured number of chunks, formatted.
    pub async fn rag(&self, name: &str, query: &str) -> PipelineResult<String> {
        Ok(self.retrieve(name, query, None).await?.format())
    }

    /// Retrieve chunks, overriding the configured count when `k` is given.
    pub async fn retrieve(
        &self,
        name: &str,
        query: &str,
        k: Option<usize>,
    ) -> PipelineResult<RetrievalResult> {
        let name = DocumentName::new(name)?;
        match k {
            Some(k) => self.retriever.retrieve_k(&name, query, k).await,
            None => self.retriever.retrieve(&name, query).await,
        }
    }

    /// Full extracted text of the document.
    pub async fn document_text(&self, name: &str) -> PipelineResult<String> {
        let name = DocumentName::new(name)?;
        Ok(self.extractor.extract(&name).await?)
    }
}

fn indexed_message(report: &IndexReport) -> String {
    if report.chunks == 0 {
        format!(
            "Document '{}' contains no extractable text; nothing was indexed.",
            report.document
        )
    } else {
        format!(
            "Document '{}' has been successfully indexed ({} chunks).",
            report.document, report.chunks
        )
    }
}
