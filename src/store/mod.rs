//! Vector collection storage.
//!
//! One tantivy index holds the entries of every collection; a JSON registry
//! next to it tracks collection metadata and entry id allocation.

pub mod collection;
pub mod error;
pub mod schema;

pub use collection::{
    CollectionHandle, CollectionStore, CollectionSummary, Entry, ScoredEntry, cosine_similarity,
};
pub use error::{StorageError, StorageResult};
pub use schema::CollectionSchema;
