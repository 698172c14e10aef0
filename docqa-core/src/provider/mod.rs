//! LLM provider abstraction layer.
//!
//! This module defines a common interface for different LLM backends
//! (Ollama, OpenAI-compatible APIs) to provide chat completions and embeddings.

mod types;
pub mod ollama;
pub mod openai;
pub mod retry;

// Re-export common types
pub use types::{ChatRequest, ChatResponse, Message, Provider, ProviderError, Result};

// Re-export provider implementations
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use retry::RetryPolicy;

use crate::config::{Config, ProviderKind};
use std::sync::Arc;

/// Builds the provider selected by `config.llm.provider`.
///
/// For OpenAI-compatible backends the API key is read from the environment
/// variable named by `llm.api_key_env` (default `OPENAI_API_KEY`).
pub fn from_config(config: &Config) -> Result<Arc<dyn Provider>> {
    let timeout = config.network.request_timeout();
    match config.llm.provider {
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(&config.llm.base_url, timeout)?)),
        ProviderKind::OpenAi => {
            let var = config.llm.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY");
            let api_key = std::env::var(var).map_err(|_| {
                ProviderError::Other(format!("Environment variable {} is not set", var))
            })?;
            Ok(Arc::new(OpenAiProvider::new(&config.llm.base_url, api_key, timeout)?))
        }
    }
}
