//! OpenAI-compatible provider implementation.
//!
//! Talks to any server exposing `/v1/chat/completions` and `/v1/embeddings`
//! with bearer-token authentication.

use super::types::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible HTTP API provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a provider for `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http_client,
        })
    }

    async fn post<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ProviderError::Api { status: status.as_u16(), body });
        }

        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = CompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
        };
        let completion: CompletionResponse = self.post("chat/completions", &body).await?;

        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ProviderError::Other("Completion returned no choices".to_string()))?;

        Ok(ChatResponse {
            model: completion.model,
            message: Message {
                role: message.role,
                content: message.content.unwrap_or_default(),
            },
        })
    }

    async fn embed_batch(&self, inputs: &[String], model: &str) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest { model, input: inputs };
        let response: EmbeddingResponse = self.post("embeddings", &body).await?;

        if response.data.len() != inputs.len() {
            return Err(ProviderError::Other(format!(
                "Expected {} embeddings, got {}",
                inputs.len(),
                response.data.len()
            )));
        }

        // The API may return items out of order; `index` is authoritative.
        let mut data = response.data;
        data.sort_by_key(|item| item.index);
        Ok(data.into_iter().map(|item| item.embedding).collect())
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: String,
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}
