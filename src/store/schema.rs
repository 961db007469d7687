//! Tantivy schema for collection entries.
//!
//! Every entry of every collection lives in one index; the `collection`
//! field scopes queries to a single document.

use tantivy::schema::{FAST, Field, NumericOptions, STORED, STRING, Schema, SchemaBuilder};

/// Schema fields for collection entries.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    /// Owning collection (the normalized document name).
    pub collection: Field,

    /// Global, monotonically increasing id. Defines insertion order.
    pub entry_id: Field,

    /// Chunk text.
    pub content: Field,

    /// Embedding as little-endian `f32` bytes.
    pub vector: Field,

    pub dimension: Field,

    /// Timestamp when indexed (UTC seconds).
    pub indexed_at: Field,
}

impl CollectionSchema {
    pub fn build() -> (Schema, Self) {
        let mut builder = SchemaBuilder::default();

        let indexed_u64 = NumericOptions::default()
            .set_indexed()
            .set_stored()
            .set_fast();

        // STRING for exact filtering
        let collection = builder.add_text_field("collection", STRING | STORED | FAST);
        let entry_id = builder.add_u64_field("entry_id", indexed_u64);
        let content = builder.add_text_field("content", STORED);
        let vector = builder.add_bytes_field("vector", STORED);
        let dimension = builder.add_u64_field("dimension", STORED);
        let indexed_at = builder.add_u64_field("indexed_at", STORED | FAST);

        let schema = builder.build();

        (
            schema,
            Self {
                collection,
                entry_id,
                content,
                vector,
                dimension,
                indexed_at,
            },
        )
    }
}

/// Encode a vector as little-endian bytes.
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode little-endian bytes produced by [`encode_vector`].
pub fn decode_vector(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}
