//! Recursive text chunking for RAG.
//!
//! Page text is split on a priority list of separators (paragraph, line,
//! sentence, word, character) into pieces that always concatenate back to the
//! original text. Pieces are greedily merged into segments, and each chunk is
//! its segment prefixed with the trailing `chunk_overlap` characters of the
//! text before it.
//!
//! All lengths are counted in `char`s, so multi-byte text is never cut inside a
//! code point.

use super::types::{Chunk, ChunkMetadata};
use crate::error::{RagError, Result};
use std::ops::Range;

/// Separators tried in order, highest priority first.
///
/// When none of them occurs in an oversized piece it is cut at character level.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "? ", "! ", " "];

/// Splits page text into overlapping, size-bounded chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Chunker {
    /// Creates a chunker producing chunks of at most `chunk_size` characters.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`; such settings would never make progress.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Validation("chunk_size must be greater than 0".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Validation(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replaces the separator priority list.
    pub fn with_separators<S: Into<String>>(
        mut self,
        separators: impl IntoIterator<Item = S>,
    ) -> Self {
        self.separators = separators
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty())
            .collect();
        self
    }

    /// Splits one page of text into chunks tagged with `source` and `page`.
    ///
    /// Empty text yields no chunks; text of at most `chunk_size` characters
    /// yields exactly one.
    pub fn split(&self, text: &str, source: &str, page: usize) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let segments = if char_len(text) <= self.chunk_size {
            vec![0..text.len()]
        } else {
            let mut pieces = Vec::new();
            self.split_recursive(text, 0, 0, &mut pieces);
            self.merge(text, pieces)
        };

        let mut chunks = Vec::with_capacity(segments.len());
        let mut char_offset = 0;
        let mut consumed = 0;

        for (chunk_index, segment) in segments.into_iter().enumerate() {
            char_offset += char_len(&text[consumed..segment.start]);
            consumed = segment.start;

            let start = if chunk_index == 0 {
                segment.start
            } else {
                back_chars(text, segment.start, self.chunk_overlap)
            };
            let overlap = char_len(&text[start..segment.start]);

            chunks.push(Chunk {
                text: text[start..segment.end].to_string(),
                metadata: ChunkMetadata {
                    source: source.to_string(),
                    page,
                    chunk_index,
                    start: char_offset - overlap,
                    overlap,
                },
            });
        }

        chunks
    }

    /// Largest segment that still leaves room for the overlap prefix.
    fn segment_budget(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Emits byte ranges of `text` (offset by `offset`) no longer than the segment budget.
    fn split_recursive(
        &self,
        text: &str,
        offset: usize,
        level: usize,
        out: &mut Vec<Range<usize>>,
    ) {
        let budget = self.segment_budget();
        if char_len(text) <= budget {
            out.push(offset..offset + text.len());
            return;
        }

        let next = self.separators[level.min(self.separators.len())..]
            .iter()
            .position(|sep| text.contains(sep.as_str()))
            .map(|i| level + i);

        match next {
            Some(level) => {
                let mut pos = offset;
                for piece in text.split_inclusive(self.separators[level].as_str()) {
                    self.split_recursive(piece, pos, level + 1, out);
                    pos += piece.len();
                }
            }
            None => {
                let mut start = 0;
                let mut count = 0;
                for (i, _) in text.char_indices() {
                    if count == budget {
                        out.push(offset + start..offset + i);
                        start = i;
                        count = 0;
                    }
                    count += 1;
                }
                out.push(offset + start..offset + text.len());
            }
        }
    }

    /// Greedily joins adjacent pieces while they fit in the segment budget.
    ///
    /// A piece of bare separators also joins the segment before it whenever the
    /// resulting chunk, overlap included, stays within `chunk_size`.
    fn merge(&self, text: &str, pieces: Vec<Range<usize>>) -> Vec<Range<usize>> {
        let budget = self.segment_budget();
        let mut segments: Vec<Range<usize>> = Vec::new();
        let mut current: Option<(Range<usize>, usize)> = None;

        for piece in pieces {
            let len = char_len(&text[piece.clone()]);
            let blank = text[piece.clone()].trim().is_empty();
            // The first chunk carries no overlap prefix
            let prefix = if segments.is_empty() { 0 } else { self.chunk_overlap };

            current = match current.take() {
                Some((range, current_len)) if current_len + len <= budget => {
                    Some((range.start..piece.end, current_len + len))
                }
                Some((range, current_len))
                    if blank && prefix + current_len + len <= self.chunk_size =>
                {
                    Some((range.start..piece.end, current_len + len))
                }
                Some((range, _)) => {
                    segments.push(range);
                    Some((piece, len))
                }
                None => Some((piece, len)),
            };
        }

        if let Some((range, _)) = current {
            segments.push(range);
        }
        segments
    }
}

/// Rebuilds page text from its chunks by dropping each chunk's overlap prefix.
pub fn reconstruct(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .flat_map(|chunk| chunk.text.chars().skip(chunk.metadata.overlap))
        .collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index `n` characters before `pos`, clamped to the start of `text`.
fn back_chars(text: &str, pos: usize, n: usize) -> usize {
    text[..pos]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(pos)
}
