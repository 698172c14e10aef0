//! Embedding generation using LLM providers.
//!
//! This module converts text into vector embeddings through a provider's
//! embedding model, bounding every call with the configured retry policy.

use crate::error::{RagError, Result};
use crate::provider::{Provider, RetryPolicy};
use std::sync::Arc;
use tracing::{debug, error};

/// Generates vector embeddings for text using LLM provider embedding models.
///
/// The embedder converts text into high-dimensional vectors that capture
/// semantic meaning. These vectors can then be compared using cosine
/// similarity to find semantically similar text.
///
/// # Supported Models
///
/// Common embedding models:
/// - `nomic-embed-text` - 768-dimensional embeddings, good general purpose (Ollama)
/// - `text-embedding-3-small` - 1536-dimensional embeddings (OpenAI)
///
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
    retry: RetryPolicy,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            provider,
            model: model.into(),
            retry,
        }
    }

    /// Generates a vector embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Service`] if the provider fails permanently or
    /// keeps failing after all retries.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Service("Embedding service returned no vectors".to_string()))
    }

    /// Generates one embedding per input text, in input order.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model = %self.model, count = texts.len(), "Requesting embeddings");
        let vectors = self
            .retry
            .run("embed", || self.provider.embed_batch(texts, &self.model))
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "Embedding request failed");
                RagError::Service("Embedding service is unavailable".to_string())
            })?;

        if vectors.len() != texts.len() {
            error!(
                model = %self.model,
                expected = texts.len(),
                received = vectors.len(),
                "Embedding count mismatch"
            );
            return Err(RagError::Service(
                "Embedding service returned an unexpected number of vectors".to_string(),
            ));
        }

        Ok(vectors)
    }
}
