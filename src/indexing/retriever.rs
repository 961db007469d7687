//! Query path: embed the question, rank the document's chunks.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::error::PipelineResult;
use super::store_task;
use crate::documents::DocumentName;
use crate::embedding::EmbeddingGenerator;
use crate::store::CollectionStore;

/// One retrieved chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedChunk {
    /// 1-based, most relevant first.
    pub rank: usize,
    pub text: String,
    /// Cosine similarity to the query.
    pub score: f32,
}

/// Ordered chunks answering one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub document: DocumentName,
    pub chunks: Vec<RankedChunk>,
}

impl RetrievalResult {
    pub fn empty(document: DocumentName) -> Self {
        Self {
            document,
            chunks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Render as `==Chunk N==` blocks separated by blank lines.
    pub fn format(&self) -> String {
        if self.chunks.is_empty() {
            return format!(
                "No indexed content found for '{}'. Index the document before querying it.",
                self.document
            );
        }

        self.chunks
            .iter()
            .map(|chunk| format!("==Chunk {}==\n{}", chunk.rank, chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for RetrievalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Top-k nearest-chunk retrieval over one document's collection.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingGenerator>,
    store: Arc<CollectionStore>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingGenerator>,
        store: Arc<CollectionStore>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve the configured number of chunks.
    pub async fn retrieve(&self, name: &DocumentName, query: &str) -> PipelineResult<RetrievalResult> {
        self.retrieve_k(name, query, self.top_k).await
    }

    /// Retrieve up to `k` chunks.
    ///
    /// An empty or unknown collection yields an empty result without calling
    /// the embedder.
    pub async fn retrieve_k(
        &self,
        name: &DocumentName,
        query: &str,
        k: usize,
    ) -> PipelineResult<RetrievalResult> {
        if k == 0 || self.store.count(name.as_str())? == 0 {
            tracing::debug!(target: "retrieval", "{name} has nothing to search");
            return Ok(RetrievalResult::empty(name.clone()));
        }

        let query_vector = self.embedder.embed_query(query).await?;
        let collection = name.as_str().to_string();
        let hits = store_task(&self.store, move |store| {
            store.similarity_search(&collection, &query_vector, k)
        })
        .await?;
        tracing::debug!(
            target: "retrieval",
            "{name}: {} hits, best score {:?}",
            hits.len(),
            hits.first().map(|hit| hit.score)
        );

        Ok(RetrievalResult {
            document: name.clone(),
            chunks: hits
                .into_iter()
                .enumerate()
                .map(|(i, hit)| RankedChunk {
                    rank: i + 1,
                    text: hit.text,
                    score: hit.score,
                })
                .collect(),
        })
    }
}
