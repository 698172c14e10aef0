//! Ollama provider implementation.
//!
//! This module provides an Ollama HTTP API client that implements the Provider trait.

use super::types::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Ollama HTTP API provider.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    http_client: reqwest::Client,
}

impl OllamaProvider {
    /// Creates a new Ollama provider for the given server.
    ///
    /// `timeout` bounds every HTTP request made by this provider.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/api/chat", self.base_url);

        let ollama_request = OllamaChatRequest {
            model: request.model,
            messages: request.messages,
            options: {
                let mut opts = HashMap::new();
                opts.insert("temperature".to_string(), serde_json::json!(request.temperature));
                Some(opts)
            },
            stream: false,
        };

        let response = self.http_client.post(&url).json(&ollama_request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ProviderError::Api { status: status.as_u16(), body });
        }

        let ollama_response = response.json::<OllamaChatResponse>().await?;
        Ok(ChatResponse {
            model: ollama_response.model,
            message: ollama_response.message,
        })
    }

    async fn embed_batch(&self, inputs: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);

        let embed_request = OllamaEmbedRequest {
            model: model.to_string(),
            input: inputs.to_vec(),
        };

        let response = self.http_client.post(&url).json(&embed_request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ProviderError::Api { status: status.as_u16(), body });
        }

        let embed_response = response.json::<OllamaEmbedResponse>().await?;
        if embed_response.embeddings.len() != inputs.len() {
            return Err(ProviderError::Other(format!(
                "Expected {} embeddings, got {}",
                inputs.len(),
                embed_response.embeddings.len()
            )));
        }

        Ok(embed_response.embeddings)
    }
}

// Ollama-specific request/response types (internal)

#[derive(Debug, Clone, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<HashMap<String, serde_json::Value>>,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaChatResponse {
    model: String,
    message: Message,
}

#[derive(Debug, Clone, Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}
