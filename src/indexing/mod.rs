//! Index and query paths over the collection store.

use std::sync::Arc;

use crate::store::{CollectionStore, StorageError, StorageResult};

pub mod coordinator;
pub mod error;
pub mod retriever;

pub use coordinator::{DocumentLocks, IndexOutcome, IndexReport, IndexingCoordinator};
pub use error::{PipelineError, PipelineResult};
pub use retriever::{RankedChunk, RetrievalResult, Retriever};

/// Run a store operation on the blocking pool.
///
/// Commits fsync and searches scan a whole collection.
pub(crate) async fn store_task<T, F>(store: &Arc<CollectionStore>, op: F) -> PipelineResult<T>
where
    T: Send + 'static,
    F: FnOnce(&CollectionStore) -> StorageResult<T> + Send + 'static,
{
    let store = Arc::clone(store);
    let result = tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?;
    Ok(result?)
}
