//! Ollama Provider Implementation
//!
//! Talks to a local Ollama instance over its `/api/chat` endpoint.
//! No credential is needed and structured invocation is not offered, so the
//! reply is whatever text the model produced inside its message.
//!
//! # Examples
//!
//! ```no_run
//! use taxotag_domain::Provider;
//! use taxotag_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new(Provider::Ollama.default_endpoint(), "llama3.2").unwrap();
//! ```

use crate::http::{HttpTransport, DEFAULT_TIMEOUT_SECS};
use crate::{ChatMessage, ChatModel, ChatRequest, LlmError, RawResponse};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use taxotag_domain::Provider;

/// Ollama API provider for local inference
#[derive(Clone)]
pub struct OllamaProvider {
    model: String,
    transport: HttpTransport,
}

/// Request body for the Ollama chat API
#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3.2", "mistral")
    pub fn new(endpoint: &str, model: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            model: model.into(),
            transport: HttpTransport::new(
                endpoint,
                None,
                Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            )?,
        })
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.transport = self.transport.with_timeout(timeout)?;
        Ok(self)
    }

    /// Base URL in use
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }
}

#[async_trait]
impl ChatModel for OllamaProvider {
    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<RawResponse, LlmError> {
        let body = OllamaChatRequest {
            model: &self.model,
            messages: &request.messages,
            stream: false,
            options: OllamaOptions { temperature: 0.0 },
        };

        let http = self.transport.post("api/chat");
        let mut reply = self.transport.send_json(http, &body, &self.model).await?;

        let message = reply.get_mut("message").map(Value::take);
        Ok(RawResponse::Structured(message.unwrap_or(reply)))
    }
}
