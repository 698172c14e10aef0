use serde::{Deserialize, Serialize};

/// A single page of extracted document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number
    pub number: usize,
    pub text: String,
}

/// Text extracted from one uploaded file, page by page.
///
/// Created once per upload and never modified afterwards.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name the document was uploaded as
    pub source: String,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(source: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            source: source.into(),
            pages,
        }
    }

    /// Whether any page carries non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|page| !page.text.trim().is_empty())
    }
}

/// Where a chunk came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub page: usize,
    /// Position of the chunk within its page
    pub chunk_index: usize,
    /// Character offset of the chunk's first character within the page text
    pub start: usize,
    /// Leading characters shared with the previous chunk of the same page
    pub overlap: usize,
}

/// A bounded passage of one page; the unit of indexing and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Stable identifier of the form `source#p{page}c{index}`.
    pub fn id(&self) -> String {
        format!(
            "{}#p{}c{}",
            self.metadata.source, self.metadata.page, self.metadata.chunk_index
        )
    }

    /// Character length of the chunk text.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A search result containing a chunk and its similarity score.
///
/// Returned by vector search operations, ordered by descending similarity score.
/// Scores are cosine similarities in `[-1.0, 1.0]`; higher is better.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// Answer to a question plus the chunks that were given to the generator as context.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub answer: String,
    /// Context chunks in retrieval order, best match first
    pub sources: Vec<Chunk>,
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub chunk_count: usize,
    pub source_name: String,
    /// Human-readable status line
    pub message: String,
}

impl IngestReport {
    pub(crate) fn new(chunk_count: usize, source_name: impl Into<String>) -> Self {
        let source_name = source_name.into();
        let message = format!(
            "Successfully processed {} chunks from {}.",
            chunk_count, source_name
        );
        Self {
            chunk_count,
            source_name,
            message,
        }
    }
}
