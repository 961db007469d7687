//! Persistent vector collections backed by tantivy.
//!
//! Entries are appended with a single commit per `add` call; the
//! `collections.json` registry beside the index records each collection's
//! vector dimension and the next global entry id.
//!
//! Several processes may share one store (a long-running `serve` next to
//! one-shot CLI commands). The tantivy writer lock is the single write
//! point: it is taken per write and released after the commit, and the
//! registry is re-read from disk while it is held. Reads reload the index
//! and the registry first.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tantivy::collector::{Count, DocSetCollector};
use tantivy::directory::MmapDirectory;
use tantivy::directory::error::LockError;
use tantivy::query::TermQuery;
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{
    Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, TantivyDocument as Document,
    TantivyError, Term,
};
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::schema::{CollectionSchema, decode_vector, encode_vector};

const REGISTRY_FILE: &str = "collections.json";
const DEFAULT_HEAP_SIZE: usize = 50_000_000;
const WRITER_LOCK_ATTEMPTS: usize = 50;
const WRITER_LOCK_RETRY: Duration = Duration::from_millis(100);

/// A (vector, text) pair to append to a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub text: String,
    pub vector: Vec<f32>,
}

impl Entry {
    pub fn new(text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            vector,
        }
    }
}

/// A stored entry with its similarity to a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub entry_id: u64,
    pub text: String,
    pub score: f32,
}

/// Reference to a registered collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHandle {
    name: String,
    id: u32,
}

impl CollectionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

/// Registry view of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    pub entries: usize,
    pub dimension: Option<usize>,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CollectionInfo {
    id: u32,
    /// Set by the first successful write.
    dimension: Option<usize>,
    created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Registry {
    collections: BTreeMap<String, CollectionInfo>,
    next_collection_id: u32,
    next_entry_id: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            collections: BTreeMap::new(),
            next_collection_id: 1,
            next_entry_id: 1,
        }
    }
}

impl Registry {
    fn get_or_register(&mut self, name: &str) -> &mut CollectionInfo {
        let next_id = &mut self.next_collection_id;
        self.collections.entry(name.to_string()).or_insert_with(|| {
            let id = *next_id;
            *next_id += 1;
            CollectionInfo {
                id,
                dimension: None,
                created_at: utc_timestamp(),
            }
        })
    }

    /// Put back the state a collection had before a failed write.
    fn restore(&mut self, name: &str, previous: Option<CollectionInfo>) {
        match previous {
            Some(info) => {
                self.collections.insert(name.to_string(), info);
            }
            None => {
                self.collections.remove(name);
            }
        }
    }
}

/// Store of named vector collections, one per document.
pub struct CollectionStore {
    base_path: PathBuf,
    index: Index,
    reader: IndexReader,
    schema: CollectionSchema,
    /// Serializes writers of this handle; other processes wait on the
    /// tantivy lock in `acquire_writer`.
    write_lock: Mutex<()>,
    registry: RwLock<Registry>,
    heap_size: usize,
}

impl std::fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("CollectionStore")
            .field("base_path", &self.base_path)
            .field("collection_count", &registry.collections.len())
            .field("next_entry_id", &registry.next_entry_id)
            .finish()
    }
}

impl CollectionStore {
    /// Create or open a store rooted at `base_path`.
    pub fn open(base_path: impl AsRef<Path>) -> StorageResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        let index_path = base_path.join("tantivy");
        std::fs::create_dir_all(&index_path)?;

        let (tantivy_schema, schema) = CollectionSchema::build();

        let existing = index_path.join("meta.json").exists();
        let index = if existing {
            Index::open_in_dir(&index_path)?
        } else {
            let dir = MmapDirectory::open(&index_path)?;
            Index::create(dir, tantivy_schema, IndexSettings::default())?
        };

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        if existing {
            reader.reload()?;
        }

        let registry = Self::load_registry(&base_path.join(REGISTRY_FILE))?;
        debug!(
            target: "store",
            "opened store at {} with {} collections",
            base_path.display(),
            registry.collections.len()
        );

        Ok(Self {
            base_path,
            index,
            reader,
            schema,
            write_lock: Mutex::new(()),
            registry: RwLock::new(registry),
            heap_size: DEFAULT_HEAP_SIZE,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Register `name` if absent and return its handle. Idempotent.
    pub fn open_or_create(&self, name: &str) -> StorageResult<CollectionHandle> {
        self.refresh_registry()?;
        if let Some(info) = self.registry.read().collections.get(name) {
            return Ok(CollectionHandle {
                name: name.to_string(),
                id: info.id,
            });
        }

        let _guard = self.write_lock.lock();
        // Held only for its lock while the registry is rewritten.
        let _writer = self.acquire_writer()?;

        let mut registry = self.registry.write();
        *registry = self.read_registry()?;
        let id = registry.get_or_register(name).id;
        self.save_registry(&registry)?;
        debug!(target: "store", "registered collection {name} as {id}");
        Ok(CollectionHandle {
            name: name.to_string(),
            id,
        })
    }

    /// Append `entries` to the collection in one commit.
    ///
    /// Either every entry becomes visible or none does. Returns the number of
    /// entries written.
    pub fn add(&self, name: &str, entries: Vec<Entry>) -> StorageResult<usize> {
        let Some(dimension) = entries.first().map(|e| e.vector.len()) else {
            return Ok(0);
        };
        if dimension == 0 {
            return Err(StorageError::InvalidVector("empty vector".to_string()));
        }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimension) {
            return Err(StorageError::DimensionMismatch {
                collection: name.to_string(),
                expected: dimension,
                actual: bad.vector.len(),
            });
        }

        let _guard = self.write_lock.lock();
        let mut writer = self.acquire_writer()?;

        let count = entries.len();
        let (first_id, previous) = {
            let mut registry = self.registry.write();
            *registry = self.read_registry()?;
            let previous = registry.collections.get(name).cloned();
            if let Some(expected) = previous
                .as_ref()
                .and_then(|info| info.dimension)
                .filter(|&expected| expected != dimension)
            {
                return Err(StorageError::DimensionMismatch {
                    collection: name.to_string(),
                    expected,
                    actual: dimension,
                });
            }

            registry.get_or_register(name).dimension = Some(dimension);
            let first_id = registry.next_entry_id;
            registry.next_entry_id += count as u64;

            // Reserve ids on disk first; a failed commit only leaves a gap.
            if let Err(e) = self.save_registry(&registry) {
                registry.next_entry_id = first_id;
                registry.restore(name, previous);
                return Err(e);
            }
            (first_id, previous)
        };

        let written = self
            .write_entries(&mut writer, name, first_id, dimension, entries)
            .and_then(|()| writer.commit().map(|_| ()));

        if let Err(e) = written {
            // Drop uncommitted documents so a later commit cannot publish them.
            if let Err(rollback) = writer.rollback() {
                tracing::warn!(target: "store", "rollback failed: {rollback}");
            }
            let mut registry = self.registry.write();
            registry.restore(name, previous);
            if let Err(save) = self.save_registry(&registry) {
                tracing::warn!(target: "store", "failed to restore registry: {save}");
            }
            return Err(e.into());
        }

        // Release the lock for other processes as soon as the commit is done.
        if let Err(e) = writer.wait_merging_threads() {
            tracing::warn!(target: "store", "merge after commit failed: {e}");
        }
        self.reader.reload()?;
        debug!(target: "store", "added {count} entries to {name}");
        Ok(count)
    }

    /// Number of entries in the collection; 0 when unknown.
    pub fn count(&self, name: &str) -> StorageResult<usize> {
        self.reader.reload()?;
        let searcher = self.reader.searcher();
        Ok(searcher.search(&self.collection_query(name), &Count)?)
    }

    /// The `k` entries most similar to `query` under cosine similarity.
    ///
    /// Ordered nearest first; equal scores keep insertion order.
    pub fn similarity_search(
        &self,
        name: &str,
        query: &[f32],
        k: usize,
    ) -> StorageResult<Vec<ScoredEntry>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        self.reader.reload()?;
        self.refresh_registry()?;
        let expected = {
            let registry = self.registry.read();
            match registry.collections.get(name).and_then(|c| c.dimension) {
                Some(dimension) => dimension,
                None => return Ok(Vec::new()),
            }
        };
        if query.len() != expected {
            return Err(StorageError::DimensionMismatch {
                collection: name.to_string(),
                expected,
                actual: query.len(),
            });
        }

        let searcher = self.reader.searcher();
        let addresses = searcher.search(&self.collection_query(name), &DocSetCollector)?;

        let mut scored = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: Document = searcher.doc(address)?;

            let entry_id = doc
                .get_first(self.schema.entry_id)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| StorageError::InvalidVector("entry without id".to_string()))?;
            let text = doc
                .get_first(self.schema.content)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let vector = doc
                .get_first(self.schema.vector)
                .and_then(|v| v.as_bytes())
                .and_then(decode_vector)
                .ok_or_else(|| {
                    StorageError::InvalidVector(format!("entry {entry_id} has a corrupt vector"))
                })?;

            scored.push(ScoredEntry {
                entry_id,
                text,
                score: cosine_similarity(query, &vector),
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.entry_id.cmp(&b.entry_id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// All registered collections with their entry counts, by name.
    pub fn list_collections(&self) -> StorageResult<Vec<CollectionSummary>> {
        self.refresh_registry()?;
        let registered: Vec<(String, CollectionInfo)> = self
            .registry
            .read()
            .collections
            .iter()
            .map(|(name, info)| (name.clone(), info.clone()))
            .collect();

        registered
            .into_iter()
            .map(|(name, info)| {
                Ok(CollectionSummary {
                    entries: self.count(&name)?,
                    name,
                    dimension: info.dimension,
                    created_at: info.created_at,
                })
            })
            .collect()
    }

    fn write_entries(
        &self,
        writer: &mut IndexWriter<Document>,
        name: &str,
        first_id: u64,
        dimension: usize,
        entries: Vec<Entry>,
    ) -> tantivy::Result<()> {
        let indexed_at = utc_timestamp();
        for (offset, entry) in entries.into_iter().enumerate() {
            let mut doc = Document::new();
            doc.add_text(self.schema.collection, name);
            doc.add_u64(self.schema.entry_id, first_id + offset as u64);
            doc.add_text(self.schema.content, &entry.text);
            doc.add_bytes(self.schema.vector, encode_vector(&entry.vector).as_slice());
            doc.add_u64(self.schema.dimension, dimension as u64);
            doc.add_u64(self.schema.indexed_at, indexed_at);
            writer.add_document(doc)?;
        }
        Ok(())
    }

    fn collection_query(&self, name: &str) -> TermQuery {
        let term = Term::from_field_text(self.schema.collection, name);
        TermQuery::new(term, IndexRecordOption::Basic)
    }

    /// Open a single-threaded writer, waiting while another handle or
    /// process holds the index lock.
    fn acquire_writer(&self) -> StorageResult<IndexWriter<Document>> {
        let mut attempt = 1;
        loop {
            match self.index.writer_with_num_threads(1, self.heap_size) {
                Ok(writer) => return Ok(writer),
                Err(TantivyError::LockFailure(LockError::LockBusy, _))
                    if attempt < WRITER_LOCK_ATTEMPTS =>
                {
                    debug!(target: "store", "index writer busy, waiting (attempt {attempt})");
                    std::thread::sleep(WRITER_LOCK_RETRY);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_registry(&self) -> StorageResult<Registry> {
        Self::load_registry(&self.base_path.join(REGISTRY_FILE))
    }

    /// Replace the cached registry with the one on disk.
    fn refresh_registry(&self) -> StorageResult<()> {
        let registry = self.read_registry()?;
        *self.registry.write() = registry;
        Ok(())
    }

    fn load_registry(path: &Path) -> StorageResult<Registry> {
        if !path.exists() {
            return Ok(Registry::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| StorageError::Registry(format!("Failed to parse {}: {e}", path.display())))
    }

    fn save_registry(&self, registry: &Registry) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(registry)
            .map_err(|e| StorageError::Registry(format!("Failed to serialize registry: {e}")))?;

        // Write then rename so a crash never leaves a truncated registry.
        let path = self.base_path.join(REGISTRY_FILE);
        let tmp = self.base_path.join(format!("{REGISTRY_FILE}.tmp"));
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Cosine similarity in `[-1, 1]`; 0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

fn utc_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(text: &str, vector: &[f32]) -> Entry {
        Entry::new(text, vector.to_vec())
    }

    #[test]
    fn test_store_creation() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();
        assert!(temp_dir.path().join("tantivy").exists());
        assert!(store.list_collections().unwrap().is_empty());
    }

    #[test]
    fn test_open_or_create_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();

        let a1 = store.open_or_create("a.pdf").unwrap();
        let a2 = store.open_or_create("a.pdf").unwrap();
        let b = store.open_or_create("b.pdf").unwrap();

        assert_eq!(a1, a2);
        assert_ne!(a1.id(), b.id());
        assert_eq!(store.count("a.pdf").unwrap(), 0);
        assert_eq!(store.list_collections().unwrap().len(), 2);
    }

    #[test]
    fn test_count_unknown_collection_is_zero() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.count("never.pdf").unwrap(), 0);
    }

    #[test]
    fn test_add_and_count() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();

        let added = store
            .add("doc.pdf", vec![entry("one", &[1.0, 0.0]), entry("two", &[0.0, 1.0])])
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.count("doc.pdf").unwrap(), 2);
        assert_eq!(store.count("other.pdf").unwrap(), 0);

        // Appends, no dedup on text
        store.add("doc.pdf", vec![entry("one", &[1.0, 0.0])]).unwrap();
        assert_eq!(store.count("doc.pdf").unwrap(), 3);
    }

    #[test]
    fn test_add_empty_batch_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.add("doc.pdf", Vec::new()).unwrap(), 0);
        assert_eq!(store.count("doc.pdf").unwrap(), 0);
    }

    #[test]
    fn test_similarity_ordering() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();
        store
            .add(
                "doc.pdf",
                vec![
                    entry("east", &[1.0, 0.0]),
                    entry("north", &[0.0, 1.0]),
                    entry("northeast", &[1.0, 1.0]),
                ],
            )
            .unwrap();

        let results = store.similarity_search("doc.pdf", &[0.1, 1.0], 3).unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["north", "northeast", "east"]);
        assert!(results[0].score >= results[1].score);
        assert!(results[1].score >= results[2].score);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();
        store
            .add(
                "doc.pdf",
                vec![
                    entry("first", &[1.0, 0.0]),
                    entry("second", &[2.0, 0.0]),
                    entry("third", &[3.0, 0.0]),
                ],
            )
            .unwrap();

        let results = store.similarity_search("doc.pdf", &[1.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "first");
        assert_eq!(results[1].text, "second");
        assert!(results[0].entry_id < results[1].entry_id);
    }

    #[test]
    fn test_k_bounding() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();
        store
            .add("doc.pdf", vec![entry("a", &[1.0, 0.0]), entry("b", &[0.0, 1.0])])
            .unwrap();

        assert!(store.similarity_search("doc.pdf", &[1.0, 0.0], 0).unwrap().is_empty());
        assert_eq!(store.similarity_search("doc.pdf", &[1.0, 0.0], 1).unwrap().len(), 1);
        assert_eq!(store.similarity_search("doc.pdf", &[1.0, 0.0], 10).unwrap().len(), 2);
        assert!(store.similarity_search("missing.pdf", &[1.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_collections_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();
        store.add("a.pdf", vec![entry("from a", &[1.0, 0.0])]).unwrap();
        store.add("b.pdf", vec![entry("from b", &[1.0, 0.0])]).unwrap();

        let results = store.similarity_search("a.pdf", &[1.0, 0.0], 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "from a");
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();
        store.add("doc.pdf", vec![entry("a", &[1.0, 0.0])]).unwrap();

        let err = store.add("doc.pdf", vec![entry("b", &[1.0, 0.0, 0.0])]).unwrap_err();
        assert!(matches!(
            err,
            StorageError::DimensionMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
        assert_eq!(store.count("doc.pdf").unwrap(), 1);

        let err = store.similarity_search("doc.pdf", &[1.0], 1).unwrap_err();
        assert!(matches!(err, StorageError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_mixed_dimensions_in_one_batch_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();
        let err = store
            .add("doc.pdf", vec![entry("a", &[1.0, 0.0]), entry("b", &[1.0])])
            .unwrap_err();
        assert!(matches!(err, StorageError::DimensionMismatch { .. }));
        assert_eq!(store.count("doc.pdf").unwrap(), 0);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = CollectionStore::open(temp_dir.path()).unwrap();
            store
                .add("doc.pdf", vec![entry("kept", &[0.6, 0.8]), entry("also", &[0.8, 0.6])])
                .unwrap();
        }

        let store = CollectionStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.count("doc.pdf").unwrap(), 2);
        let results = store.similarity_search("doc.pdf", &[0.6, 0.8], 1).unwrap();
        assert_eq!(results[0].text, "kept");

        // New ids continue after the persisted ones
        store.add("doc.pdf", vec![entry("later", &[0.0, 1.0])]).unwrap();
        let all = store.similarity_search("doc.pdf", &[0.0, 1.0], 3).unwrap();
        let later = all.iter().find(|e| e.text == "later").unwrap();
        assert!(all.iter().all(|e| e.entry_id <= later.entry_id));
    }

    #[test]
    fn test_list_collections_reports_counts() {
        let temp_dir = TempDir::new().unwrap();
        let store = CollectionStore::open(temp_dir.path()).unwrap();
        store.add("beta.pdf", vec![entry("x", &[1.0])]).unwrap();
        store.open_or_create("alpha.pdf").unwrap();

        let listed = store.list_collections().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "alpha.pdf");
        assert_eq!(listed[0].entries, 0);
        assert_eq!(listed[0].dimension, None);
        assert_eq!(listed[1].name, "beta.pdf");
        assert_eq!(listed[1].entries, 1);
        assert_eq!(listed[1].dimension, Some(1));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_handles_on_one_store_see_each_other() {
        let temp_dir = TempDir::new().unwrap();
        let server = CollectionStore::open(temp_dir.path()).unwrap();

        {
            let cli = CollectionStore::open(temp_dir.path()).unwrap();
            cli.add("a.pdf", vec![entry("alpha", &[1.0, 0.0])]).unwrap();
        }
        assert_eq!(server.count("a.pdf").unwrap(), 1);
        assert_eq!(
            server.similarity_search("a.pdf", &[1.0, 0.0], 5).unwrap().len(),
            1
        );

        server.add("b.pdf", vec![entry("beta", &[0.0, 1.0])]).unwrap();

        let fresh = CollectionStore::open(temp_dir.path()).unwrap();
        let a_hits = fresh.similarity_search("a.pdf", &[1.0, 0.0], 5).unwrap();
        let b_hits = fresh.similarity_search("b.pdf", &[0.0, 1.0], 5).unwrap();
        assert_eq!(a_hits.len(), fresh.count("a.pdf").unwrap());
        assert_eq!(a_hits[0].text, "alpha");
        assert_eq!(b_hits[0].text, "beta");
        // Ids keep growing across handles
        assert!(b_hits[0].entry_id > a_hits[0].entry_id);

        let names: Vec<String> = fresh
            .list_collections()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_writer_is_released_between_adds() {
        let temp_dir = TempDir::new().unwrap();
        let first = CollectionStore::open(temp_dir.path()).unwrap();
        let second = CollectionStore::open(temp_dir.path()).unwrap();

        first.add("a.pdf", vec![entry("one", &[1.0])]).unwrap();
        second.add("b.pdf", vec![entry("two", &[1.0])]).unwrap();
        first.add("a.pdf", vec![entry("three", &[1.0])]).unwrap();
        second.open_or_create("c.pdf").unwrap();

        assert_eq!(first.count("a.pdf").unwrap(), 2);
        assert_eq!(first.count("b.pdf").unwrap(), 1);
        assert_eq!(first.list_collections().unwrap().len(), 3);
    }
}
