//! Documents: naming, text extraction, and chunking.
//!
//! This module provides:
//! - `DocumentName` normalization (one `.pdf` suffix, no path components)
//! - PDF text extraction behind the `TextExtractor` trait
//! - Overlapping, size-bounded chunking

pub mod chunker;
pub mod config;
pub mod extract;
pub mod types;

pub use chunker::{Chunker, ChunkingError, Chunks, RecursiveChunker};
pub use config::{ChunkingConfig, RetrievalConfig};
pub use extract::{ExtractionError, PdfExtractor, TextExtractor};
pub use types::{DocumentName, RawChunk};
