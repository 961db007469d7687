//! Core types for documents and their chunks.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::extract::ExtractionError;

const PDF_SUFFIX: &str = ".pdf";

/// Stable name of a document, normalized to a single `.pdf` suffix.
///
/// The name doubles as the collection name in the vector store and as the
/// file name inside the documents directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentName(String);

impl DocumentName {
    /// Normalize a raw file name into a document name.
    ///
    /// `report` becomes `report.pdf`, `report.pdf.pdf` becomes `report.pdf`.
    /// Suffix matching ignores ASCII case; the original casing of the stem is kept.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ExtractionError> {
        let trimmed = raw.as_ref().trim();

        if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
            return Err(ExtractionError::InvalidName(trimmed.to_string()));
        }
        if trimmed.contains(['/', '\\']) || trimmed.contains('\0') {
            return Err(ExtractionError::InvalidName(trimmed.to_string()));
        }

        let mut stem = trimmed;
        while has_pdf_suffix(stem) {
            stem = &stem[..stem.len() - PDF_SUFFIX.len()];
        }
        if stem.is_empty() {
            return Err(ExtractionError::InvalidName(trimmed.to_string()));
        }

        // Keep the caller's suffix casing when exactly one was present.
        let name = if has_pdf_suffix(trimmed) && trimmed.len() == stem.len() + PDF_SUFFIX.len() {
            trimmed.to_string()
        } else {
            format!("{stem}{PDF_SUFFIX}")
        };

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn has_pdf_suffix(name: &str) -> bool {
    name.len() >= PDF_SUFFIX.len()
        && name.is_char_boundary(name.len() - PDF_SUFFIX.len())
        && name[name.len() - PDF_SUFFIX.len()..].eq_ignore_ascii_case(PDF_SUFFIX)
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DocumentName {
    type Error = ExtractionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentName> for String {
    fn from(name: DocumentName) -> Self {
        name.0
    }
}

/// A chunk of extracted text, borrowed from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk<'a> {
    /// Position of this chunk in the sequence (0-based).
    pub index: usize,

    /// Byte range in the source text (start, end).
    pub byte_range: (usize, usize),

    /// The text content of this chunk.
    pub content: &'a str,
}

impl RawChunk<'_> {
    /// Get character count.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}
