//! pdfrag: question answering over PDF documents.
//!
//! The pipeline, leaves first:
//! - [`documents`]: names, text extraction, chunking
//! - [`embedding`]: text to vectors
//! - [`store`]: persistent per-document vector collections
//! - [`indexing`]: the index path (coordinator) and query path (retriever)
//! - [`engine`]: everything wired together from [`Settings`]
//!
//! [`mcp`] and [`cli`] are thin surfaces over [`RagEngine`].

pub mod cli;
pub mod config;
pub mod documents;
pub mod embedding;
pub mod engine;
pub mod indexing;
pub mod logging;
pub mod mcp;
pub mod store;

pub use config::Settings;
pub use documents::DocumentName;
pub use engine::RagEngine;
pub use indexing::{IndexOutcome, IndexReport, PipelineError, RetrievalResult};
