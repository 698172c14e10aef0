//! Answer generation through a provider's chat model.

use crate::error::{RagError, Result};
use crate::provider::{ChatRequest, Message, Provider, RetryPolicy};
use std::sync::Arc;
use tracing::{debug, error};

/// Turns an assembled prompt into answer text.
#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f64,
    system_prompt: String,
    retry: RetryPolicy,
}

impl Generator {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            system_prompt: system_prompt.into(),
            retry,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sends `prompt` to the chat model and returns the trimmed answer.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Service`] when the provider fails after retries or
    /// answers with empty text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if !self.system_prompt.is_empty() {
            messages.push(Message::system(&self.system_prompt));
        }
        messages.push(Message::user(prompt));

        let request = ChatRequest::new(&self.model, messages).with_temperature(self.temperature);

        debug!(model = %self.model, prompt_chars = prompt.len(), "Requesting completion");
        let response = self
            .retry
            .run("generate", || self.provider.chat(request.clone()))
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "Generation request failed");
                RagError::Service("Generation service is unavailable".to_string())
            })?;

        let answer = response.message.content.trim();
        if answer.is_empty() {
            error!(model = %self.model, "Generation returned empty content");
            return Err(RagError::Service(
                "Generation service returned an empty answer".to_string(),
            ));
        }

        Ok(answer.to_string())
    }
}
