//! In-memory vector index and search.
//!
//! This module provides a simple but effective vector index using in-memory
//! storage and cosine similarity for search.

use super::embedder::Embedder;
use super::types::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use tracing::{debug, info};

/// An immutable in-memory vector index over the chunks of one document.
///
/// The index is built in one step from a complete chunk set and never mutated
/// afterwards; replacing the corpus means building a new index. This lets the
/// engine share it behind an `Arc` and swap it atomically.
///
/// # Characteristics
///
/// - **Simple**: No external dependencies or setup required
/// - **Exact**: O(n) linear scan, so top-k is always the true top-k
/// - **Ephemeral**: Data is lost when the process ends
///
/// Suitable for the hundreds to low thousands of chunks a single PDF produces.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<Entry>,
    dimension: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

impl VectorIndex {
    /// Embeds every chunk in batches of `batch_size` and builds the index.
    ///
    /// Chunks keep their input order, which is also the tie-break order for search.
    ///
    /// # Errors
    ///
    /// - [`RagError::Validation`] if `chunks` is empty or `batch_size` is zero
    /// - [`RagError::Service`] if embedding fails or vectors have inconsistent dimensions
    pub async fn build(chunks: Vec<Chunk>, embedder: &Embedder, batch_size: usize) -> Result<Self> {
        if chunks.is_empty() {
            return Err(RagError::Validation("Cannot build an index from zero chunks".to_string()));
        }
        if batch_size == 0 {
            return Err(RagError::Validation("batch_size must be greater than 0".to_string()));
        }

        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size) {
            debug!("Processing batch of {} chunks", batch.len());
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            embeddings.extend(embedder.embed_batch(&texts).await?);
        }

        let index = Self::from_embeddings(chunks, embeddings)?;
        info!(chunks = index.len(), dimension = index.dimension, "Vector index built");
        Ok(index)
    }

    /// Builds an index from chunks and precomputed embeddings, pairwise.
    pub fn from_embeddings(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(RagError::Validation("Cannot build an index from zero chunks".to_string()));
        }
        if chunks.len() != embeddings.len() {
            return Err(RagError::Service(format!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimension = embeddings[0].len();
        if dimension == 0 || embeddings.iter().any(|e| e.len() != dimension) {
            return Err(RagError::Service("Embeddings have inconsistent dimensions".to_string()));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Entry { chunk, embedding })
            .collect();

        Ok(Self { entries, dimension })
    }

    /// Returns the `k` chunks most similar to `query_embedding`, best first.
    ///
    /// Performs a linear scan computing cosine similarity against every
    /// stored embedding. Equal scores keep insertion order. If `k` exceeds the
    /// number of chunks, every chunk is returned.
    ///
    /// # Errors
    ///
    /// - [`RagError::Validation`] if `k` is zero
    /// - [`RagError::Service`] if the query dimension differs from the index
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::Validation("k must be greater than 0".to_string()));
        }
        if query_embedding.len() != self.dimension {
            return Err(RagError::Service(format!(
                "Query embedding has dimension {}, index has {}",
                query_embedding.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query_embedding, &entry.embedding)))
            .collect();

        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| SearchResult {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Indexed chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|entry| &entry.chunk)
    }
}

/// Computes cosine similarity between two vectors.
///
/// Returns values from -1.0 (opposite) to 1.0 (identical), with 0.0 indicating
/// orthogonal vectors. Returns 0.0 for mismatched lengths or zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
