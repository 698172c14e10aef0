//! Retrieval Augmented Generation (RAG) over a single PDF document.
//!
//! # Overview
//!
//! RAG (Retrieval Augmented Generation) is a technique that combines:
//! 1. **Retrieval**: Finding the passages of the document most similar to a question
//! 2. **Augmentation**: Adding those passages as context to the LLM prompt
//! 3. **Generation**: The LLM answers using only the added context
//!
//! # Architecture
//!
//! - [`RagEngine`]: Orchestrates ingestion and query, owns the active index
//! - [`chunker`]: Recursive separator-based text splitting with overlap
//! - [`Embedder`]: Converts text to vector embeddings via a [`Provider`]
//! - [`VectorIndex`]: Immutable in-memory index with cosine similarity search
//! - [`prompt`]: Builds the generator prompt from retrieved chunks
//! - [`Generator`]: Produces the answer via a [`Provider`]
//! - [`loader`]: Extracts page text from PDF files
//!
//! # How It Works
//!
//! 1. **Ingestion Phase**:
//!    - The PDF is split into pages, and each non-blank page into chunks
//!      (default: 1000 characters with 100 characters of overlap)
//!    - Chunks are embedded in batches and a new index is built
//!    - The new index replaces the previous one in a single swap
//!
//! 2. **Query Phase**:
//!    - The question is embedded and the top-k most similar chunks are found
//!    - Those chunks and the question are assembled into a prompt
//!    - The generator answers; the chunks are returned as sources

pub mod chunker;
mod embedder;
mod generator;
pub mod loader;
pub mod prompt;
mod store;
mod types;

pub use chunker::Chunker;
pub use embedder::Embedder;
pub use generator::Generator;
pub use loader::{DocumentLoader, PdfLoader};
pub use store::VectorIndex;
pub use types::{Chunk, ChunkMetadata, Document, IngestReport, Page, QueryResult, SearchResult};

use crate::config::Config;
use crate::error::{RagError, Result};
use crate::provider::{Provider, RetryPolicy};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// The index currently answering queries, with the name of the file it was built from.
#[derive(Debug)]
struct ActiveIndex {
    source_name: String,
    index: VectorIndex,
}

/// The main RAG engine orchestrating ingestion and question answering.
///
/// # Lifecycle
///
/// A new engine has no index and rejects queries with
/// [`RagError::Precondition`]. A successful ingestion builds a complete index
/// and swaps it in; a failed one leaves the previous index untouched.
/// [`clear`](Self::clear) returns the engine to the empty state.
///
/// # Thread Safety
///
/// The engine is `Clone` and every clone shares the same index. Builds are
/// serialized and happen outside the index lock, so queries running during a
/// build keep seeing the previous complete index until the swap.
///
/// # Configuration
///
/// The engine uses configuration from [`Config`]:
/// - `rag.embedding_model`: Model for generating embeddings
/// - `rag.chunk_size`, `rag.chunk_overlap`: Chunk bounds in characters
/// - `rag.top_k`: Number of chunks given to the generator
/// - `rag.embed_batch_size`: Chunks per embedding request
/// - `llm.model`, `llm.temperature`, `system_prompt`: Generation settings
/// - `network.*`: Timeout and retry policy for every provider call
#[derive(Clone)]
pub struct RagEngine {
    chunker: Chunker,
    embedder: Embedder,
    generator: Generator,
    loader: Arc<dyn DocumentLoader>,
    top_k: usize,
    batch_size: usize,
    active: Arc<RwLock<Option<Arc<ActiveIndex>>>>,
    build_lock: Arc<Mutex<()>>,
}

impl RagEngine {
    /// Creates an engine with no index, loading PDFs with [`PdfLoader`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use docqa_core::{Config, RagEngine, provider};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = Config::default();
    /// let provider = provider::from_config(&config)?;
    /// let engine = RagEngine::new(&config, provider)?;
    ///
    /// println!("{}", engine.process_pdf("paper.pdf").await?);
    /// let result = engine.query("What is the main finding?").await?;
    /// println!("{}", result.answer);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Validation`] if the chunking, `top_k` or batch
    /// settings are unusable.
    pub fn new(config: &Config, provider: Arc<dyn Provider>) -> Result<Self> {
        let rag = &config.rag;
        let chunker = Chunker::new(rag.chunk_size, rag.chunk_overlap)?;
        if rag.top_k == 0 {
            return Err(RagError::Validation("top_k must be greater than 0".to_string()));
        }
        if rag.embed_batch_size == 0 {
            return Err(RagError::Validation("embed_batch_size must be greater than 0".to_string()));
        }

        let retry = RetryPolicy::from(&config.network);
        let embedder = Embedder::new(provider.clone(), &rag.embedding_model, retry);
        let generator = Generator::new(provider, &config.llm.model, &config.system_prompt, retry)
            .with_temperature(config.llm.temperature);

        Ok(Self {
            chunker,
            embedder,
            generator,
            loader: Arc::new(PdfLoader),
            top_k: rag.top_k,
            batch_size: rag.embed_batch_size,
            active: Arc::new(RwLock::new(None)),
            build_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Replaces the document loader.
    pub fn with_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Ingests the PDF at `path`, replacing any previously indexed document.
    ///
    /// Returns a status line such as `"Successfully processed 12 chunks from paper.pdf."`.
    ///
    /// # Errors
    ///
    /// - [`RagError::Ingestion`] if the file cannot be parsed or has no extractable text
    /// - [`RagError::Service`] if embedding fails
    ///
    /// On any error the previously active index stays in place.
    pub async fn process_pdf(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let report = self.ingest(path, &source).await?;
        Ok(report.message)
    }

    /// Ingests uploaded PDF bytes under their original file name.
    ///
    /// The bytes are written to a temporary `.pdf` file that is removed before
    /// this returns, whether ingestion succeeds or not.
    ///
    /// # Errors
    ///
    /// - [`RagError::Validation`] if the name is empty, lacks a `.pdf`
    ///   extension, or the content is not a PDF. Nothing is written to disk.
    /// - Otherwise as [`process_pdf`](Self::process_pdf).
    pub async fn process_upload(&self, file_name: &str, bytes: &[u8]) -> Result<IngestReport> {
        let source = Path::new(file_name.trim())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if source.is_empty() {
            return Err(RagError::Validation("No selected file".to_string()));
        }
        if !loader::is_pdf(&source, bytes) {
            return Err(RagError::Validation(
                "Invalid file type. Please upload a PDF.".to_string(),
            ));
        }

        let upload = tempfile::Builder::new()
            .prefix("docqa-upload-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| RagError::Ingestion(format!("Failed to create temporary file: {}", e)))?;

        tokio::fs::write(upload.path(), bytes)
            .await
            .map_err(|e| RagError::Ingestion(format!("Failed to write temporary file: {}", e)))?;

        let result = self.ingest(upload.path(), &source).await;

        if let Err(e) = upload.close() {
            warn!(error = %e, "Failed to remove temporary upload file");
        }

        result
    }

    /// Loads, chunks and indexes one document, then swaps the new index in.
    async fn ingest(&self, path: &Path, source: &str) -> Result<IngestReport> {
        let _build = self.build_lock.lock().await;

        info!(source, "Ingesting document");
        let document = self.loader.load(path, source).await?;
        if !document.has_text() {
            return Err(RagError::Ingestion(format!(
                "No extractable text found in {}",
                document.source
            )));
        }

        let chunks: Vec<Chunk> = document
            .pages
            .iter()
            .filter(|page| !page.text.trim().is_empty())
            .flat_map(|page| self.chunker.split(&page.text, &document.source, page.number))
            .collect();
        debug!(source, pages = document.pages.len(), chunks = chunks.len(), "Document chunked");

        let index = VectorIndex::build(chunks, &self.embedder, self.batch_size).await?;
        let report = IngestReport::new(index.len(), &document.source);

        *self.active.write().await = Some(Arc::new(ActiveIndex {
            source_name: document.source,
            index,
        }));

        info!(source, chunks = report.chunk_count, "Document indexed");
        Ok(report)
    }

    /// Finds the `top_k` chunks most similar to `question`, best first.
    ///
    /// # Errors
    ///
    /// - [`RagError::Validation`] if the question is blank
    /// - [`RagError::Precondition`] if no document has been ingested
    /// - [`RagError::Service`] if embedding the question fails
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        if question.trim().is_empty() {
            return Err(RagError::Validation("No question provided".to_string()));
        }

        let active = self.snapshot().await.ok_or_else(RagError::not_ready)?;

        debug!("Generating query embedding");
        let query_embedding = self.embedder.embed(question).await?;
        let results = active.index.search(&query_embedding, self.top_k)?;

        debug!(
            source = %active.source_name,
            results = results.len(),
            top_score = results.first().map(|r| r.score),
            "Retrieved context"
        );
        Ok(results)
    }

    /// Answers `question` from the ingested document.
    ///
    /// The answer is generated from the retrieved chunks only, and those chunks
    /// are returned as the sources in retrieval order.
    ///
    /// # Errors
    ///
    /// As [`retrieve`](Self::retrieve), plus [`RagError::Service`] if
    /// generation fails or returns an empty answer.
    pub async fn query(&self, question: &str) -> Result<QueryResult> {
        let results = self.retrieve(question).await?;
        let sources: Vec<Chunk> = results.into_iter().map(|r| r.chunk).collect();

        let prompt = prompt::assemble(&sources, question);
        let answer = self.generator.generate(&prompt).await?;

        info!(sources = sources.len(), answer_chars = answer.len(), "Question answered");
        Ok(QueryResult { answer, sources })
    }

    /// Whether a document has been ingested and queries can be served.
    pub async fn is_ready(&self) -> bool {
        self.active.read().await.is_some()
    }

    /// Number of chunks in the active index, `0` when empty.
    pub async fn count(&self) -> usize {
        self.snapshot().await.map(|a| a.index.len()).unwrap_or(0)
    }

    /// File name of the document behind the active index.
    pub async fn source_name(&self) -> Option<String> {
        self.snapshot().await.map(|a| a.source_name.clone())
    }

    /// Drops the active index; subsequent queries fail until the next ingestion.
    pub async fn clear(&self) {
        let _build = self.build_lock.lock().await;
        if self.active.write().await.take().is_some() {
            info!("Vector index cleared");
        }
    }

    async fn snapshot(&self) -> Option<Arc<ActiveIndex>> {
        self.active.read().await.clone()
    }
}
