//! docqa-core - Question answering over a PDF document
//!
//! Provides the building blocks for retrieval-augmented generation over a
//! single uploaded document:
//! - LLM provider abstraction (Ollama, OpenAI-compatible)
//! - RAG engine (chunking, embedding, vector index, prompt assembly, generation)
//! - Configuration management
//! - Server API (Unix socket boundary for uploads and questions)
//!
//! ## Primary API
//!
//! Most callers interact with [`RagEngine`]: ingest a PDF with
//! [`RagEngine::process_pdf`] or [`RagEngine::process_upload`], then ask
//! questions with [`RagEngine::query`].

// Public modules
pub mod config;
pub mod error;
pub mod provider;
pub mod rag;
pub mod server;

// Public exports
pub use config::Config;
pub use error::{ErrorKind, RagError};
pub use rag::{
    Chunk, ChunkMetadata, Chunker, Document, DocumentLoader, IngestReport, Page, PdfLoader,
    QueryResult, RagEngine, SearchResult, VectorIndex,
};
pub use server::{Reply, Request, Server, ServerError};

// Provider exports
pub use provider::{ChatRequest, ChatResponse, Message, Provider, ProviderError};
