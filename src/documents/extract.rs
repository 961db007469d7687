//! Text extraction from source documents.
//!
//! Uses pdf-extract to pull the text layer out of a PDF. Parsing is CPU-bound
//! and occasionally panics on malformed input, so it runs on a blocking thread
//! where a panic surfaces as a join error.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::types::DocumentName;

/// Errors from locating or reading a document.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Invalid document name: {0:?}")]
    InvalidName(String),

    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

/// Source of plain text for a named document.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Return the full text of the document, trimmed.
    ///
    /// An empty string is a valid result for documents without a text layer.
    async fn extract(&self, name: &DocumentName) -> Result<String, ExtractionError>;
}

/// Extractor for PDF files stored in a documents directory.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    documents_dir: PathBuf,
}

impl PdfExtractor {
    pub fn new(documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir: documents_dir.into(),
        }
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    /// Path the named document is expected at.
    pub fn path_for(&self, name: &DocumentName) -> PathBuf {
        self.documents_dir.join(name.as_str())
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, name: &DocumentName) -> Result<String, ExtractionError> {
        let path = self.path_for(name);
        debug!(target: "extract", "extracting PDF {}", path.display());

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractionError::NotFound(path));
            }
            Err(source) => return Err(ExtractionError::Io { path, source }),
        };

        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| ExtractionError::Parse {
                path: path.clone(),
                reason: format!("extraction task failed: {e}"),
            })?
            .map_err(|e| ExtractionError::Parse {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let text = text.trim().to_string();
        debug!(
            target: "extract",
            "extracted {} chars from {}",
            text.chars().count(),
            path.display()
        );
        Ok(text)
    }
}
