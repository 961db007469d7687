//! Document chunking.
//!
//! Provides the `Chunker` trait and a recursive-boundary implementation that
//! splits extracted text into overlapping, size-bounded chunks.

use std::iter::FusedIterator;

use thiserror::Error;

use super::config::ChunkingConfig;
use super::types::RawChunk;

/// Errors from chunker construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("Invalid chunking configuration: {0}")]
    InvalidConfig(String),
}

/// Trait for document chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split document content into chunks.
    fn chunk<'a>(&self, content: &'a str) -> Vec<RawChunk<'a>>;
}

/// Separator classes in order of preference.
///
/// Each class is tried in turn; the last occurrence inside the search window
/// wins. Whitespace and single characters are handled separately.
const SEPARATOR_CLASSES: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "]];

/// Recursive chunker: sliding window that backs off to natural breakpoints.
///
/// Algorithm:
/// 1. Take a window of at most `chunk_size` characters from the current start
/// 2. End the chunk after the last paragraph, line, sentence or word break
///    that lies past the overlap region; cut mid-word only if there is none
/// 3. Start the next chunk `overlap` characters before the end, moved forward
///    to a word start when the overlap region contains one
///
/// Chunks are exact slices of the input, so the byte ranges tile the source
/// text with overlaps and nothing is dropped.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    config: ChunkingConfig,
}

impl RecursiveChunker {
    /// Create a chunker, rejecting configurations that cannot terminate.
    pub fn new(config: ChunkingConfig) -> Result<Self, ChunkingError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Lazily split `text` into chunks.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks::new(text, self.config.chunk_size, self.config.overlap)
    }
}

impl Chunker for RecursiveChunker {
    fn chunk<'a>(&self, content: &'a str) -> Vec<RawChunk<'a>> {
        self.chunks(content).collect()
    }
}

/// Iterator over the chunks of one text. Consumed once.
#[derive(Debug)]
pub struct Chunks<'a> {
    text: &'a str,
    /// Byte offset of every char, followed by `text.len()`.
    offsets: Vec<usize>,
    chunk_size: usize,
    overlap: usize,
    /// Char index where the next chunk starts.
    start: usize,
    index: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    fn new(text: &'a str, chunk_size: usize, overlap: usize) -> Self {
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        Self {
            text,
            offsets,
            chunk_size,
            overlap,
            start: 0,
            index: 0,
            done: text.is_empty(),
        }
    }

    fn char_len(&self) -> usize {
        self.offsets.len() - 1
    }

    fn char_index_of(&self, byte: usize) -> usize {
        // Separators are whole chars, so every break lands on a boundary.
        self.offsets
            .binary_search(&byte)
            .unwrap_or_else(|insert_at| insert_at)
    }

    /// Find the end (exclusive char index) of a chunk that does not fit.
    ///
    /// The break must lie in `(start + overlap, start + chunk_size]` so the
    /// next chunk still starts after this one.
    fn find_break(&self) -> usize {
        let lo = self.start + self.overlap;
        let hi = self.start + self.chunk_size;
        let window_start = self.offsets[lo];
        let window = &self.text[window_start..self.offsets[hi]];

        for class in SEPARATOR_CLASSES {
            let best = class
                .iter()
                .filter_map(|sep| window.rfind(sep).map(|pos| pos + sep.len()))
                .max();
            if let Some(end) = best {
                return self.char_index_of(window_start + end);
            }
        }

        if let Some((pos, ws)) = window.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
            return self.char_index_of(window_start + pos + ws.len_utf8());
        }

        hi
    }

    /// Start of the chunk following one that ended at `end`.
    fn next_start(&self, end: usize) -> usize {
        let candidate = end - self.overlap;
        if self.overlap == 0 {
            return candidate;
        }

        (candidate.max(1)..end)
            .find(|&pos| self.char_at(pos - 1).is_whitespace() && !self.char_at(pos).is_whitespace())
            .unwrap_or(candidate)
    }

    fn char_at(&self, index: usize) -> char {
        self.text[self.offsets[index]..]
            .chars()
            .next()
            .unwrap_or_default()
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = RawChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let total = self.char_len();
        let end = if total - self.start <= self.chunk_size {
            self.done = true;
            total
        } else {
            self.find_break()
        };

        let byte_range = (self.offsets[self.start], self.offsets[end]);
        let chunk = RawChunk {
            index: self.index,
            byte_range,
            content: &self.text[byte_range.0..byte_range.1],
        };

        self.index += 1;
        if !self.done {
            self.start = self.next_start(end);
        }

        Some(chunk)
    }
}

impl FusedIterator for Chunks<'_> {}
