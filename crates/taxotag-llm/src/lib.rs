//! Taxotag LLM Provider Layer
//!
//! One async interface, [`ChatModel`], over the chat backends a tagger can
//! talk to, plus a deterministic [`MockProvider`] for tests.
//!
//! # Providers
//!
//! - `OpenAiProvider`: OpenAI and every OpenAI-compatible service (Mistral AI, Groq)
//! - `AnthropicProvider`: Anthropic messages API
//! - `GeminiProvider`: Google Gemini `generateContent`
//! - `OllamaProvider`: local Ollama instance
//! - `MockProvider`: canned replies, no network
//!
//! [`connect`] picks the right implementation for a
//! [`BackendDescriptor`](taxotag_domain::BackendDescriptor).
//!
//! # Examples
//!
//! ```
//! use taxotag_llm::{ChatMessage, ChatModel, ChatRequest, MockProvider, RawResponse};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new("#rust, #async");
//! let request = ChatRequest::new(vec![ChatMessage::user("hello")]);
//! let reply = provider.complete(&request).await.unwrap();
//! assert_eq!(reply, RawResponse::Text("#rust, #async".to_string()));
//! assert_eq!(provider.call_count(), 1);
//! # }
//! ```

#![warn(missing_docs)]

mod http;

pub mod anthropic;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod request;
pub mod response;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use taxotag_domain::{BackendDescriptor, Provider};
use thiserror::Error;
use tracing::debug;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use http::DEFAULT_TIMEOUT_SECS;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use request::{ChatMessage, ChatRequest, Role, ToolSchema};
pub use response::RawResponse;

/// Errors that can occur while talking to a model backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Credential rejected (HTTP 401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Connection could not be established
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    /// Blocked by a cross-origin policy
    #[error("Request blocked by CORS policy: {0}")]
    CrossOriginBlocked(String),

    /// No reply within the time limit
    #[error("Request timed out")]
    Timeout,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Any other non-success status
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Reply could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Base URL did not parse
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Unknown(String),
}

impl LlmError {
    /// True when no usable HTTP exchange happened at all
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            LlmError::Unreachable(_) | LlmError::Timeout | LlmError::CrossOriginBlocked(_)
        )
    }
}

/// A chat-capable model backend
///
/// Implementations are stateless between calls: each `complete` carries the
/// whole conversation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Which provider this backend belongs to
    fn provider(&self) -> Provider;

    /// Model identifier sent with each request
    fn model(&self) -> &str;

    /// Whether the backend can be forced to call a tool
    fn supports_structured(&self) -> bool {
        self.provider().supports_structured_invocation()
    }

    /// Send one request and return the raw reply
    async fn complete(&self, request: &ChatRequest) -> Result<RawResponse, LlmError>;
}

/// Build the backend described by `descriptor` with the default timeout
pub fn connect(descriptor: &BackendDescriptor) -> Result<Arc<dyn ChatModel>, LlmError> {
    connect_with_timeout(descriptor, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Build the backend described by `descriptor`
///
/// OpenAI, Mistral AI and Groq share one OpenAI-compatible client; the others
/// get their own wire format.
pub fn connect_with_timeout(
    descriptor: &BackendDescriptor,
    timeout: Duration,
) -> Result<Arc<dyn ChatModel>, LlmError> {
    let endpoint = descriptor.endpoint();
    let model = descriptor.model.clone();
    let key = descriptor.credential.clone();

    debug!(
        "Connecting to {} model '{}' at {}",
        descriptor.provider, model, endpoint
    );

    let backend: Arc<dyn ChatModel> = match descriptor.provider {
        Provider::OpenAi | Provider::MistralAi | Provider::Groq => Arc::new(
            OpenAiProvider::new(descriptor.provider, endpoint, model, key)?
                .with_timeout(timeout)?,
        ),
        Provider::Anthropic => {
            Arc::new(AnthropicProvider::new(endpoint, model, key)?.with_timeout(timeout)?)
        }
        Provider::GoogleGenAi => {
            Arc::new(GeminiProvider::new(endpoint, model, key)?.with_timeout(timeout)?)
        }
        Provider::Ollama => Arc::new(OllamaProvider::new(endpoint, model)?.with_timeout(timeout)?),
    };

    Ok(backend)
}

/// Mock provider for deterministic testing
///
/// Returns pre-configured replies without making any network calls. Queued
/// replies are served first, in order; once the queue is empty every call
/// gets the default result.
///
/// # Examples
///
/// ```
/// use taxotag_llm::{ChatMessage, ChatModel, ChatRequest, LlmError, MockProvider};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = MockProvider::new("#a");
/// provider.push_error(LlmError::RateLimitExceeded);
///
/// let request = ChatRequest::new(vec![ChatMessage::user("doc")]);
/// assert!(provider.complete(&request).await.is_err());
/// assert!(provider.complete(&request).await.is_ok());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    provider: Provider,
    model: String,
    default_result: Result<RawResponse, LlmError>,
    queued: Arc<Mutex<VecDeque<Result<RawResponse, LlmError>>>>,
    call_count: Arc<Mutex<usize>>,
    last_request: Arc<Mutex<Option<ChatRequest>>>,
    delay: Option<Duration>,
}

/// Lock, recovering the data if a panicking test poisoned the mutex
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockProvider {
    /// Create a MockProvider answering every request with `response`
    pub fn new(response: impl Into<RawResponse>) -> Self {
        Self::with_result(Ok(response.into()))
    }

    /// Create a MockProvider failing every request with `error`
    pub fn failing(error: LlmError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(default_result: Result<RawResponse, LlmError>) -> Self {
        Self {
            provider: Provider::OpenAi,
            model: "mock-model".to_string(),
            default_result,
            queued: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_request: Arc::new(Mutex::new(None)),
            delay: None,
        }
    }

    /// Report a different provider (changes `supports_structured`)
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Report a different model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a one-off reply
    pub fn push_response(&self, response: impl Into<RawResponse>) {
        lock(&self.queued).push_back(Ok(response.into()));
    }

    /// Queue a one-off failure
    pub fn push_error(&self, error: LlmError) {
        lock(&self.queued).push_back(Err(error));
    }

    /// Get the number of times `complete` was called
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
    }

    /// The most recent request received
    pub fn last_request(&self) -> Option<ChatRequest> {
        lock(&self.last_request).clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl ChatModel for MockProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<RawResponse, LlmError> {
        *lock(&self.call_count) += 1;
        *lock(&self.last_request) = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = lock(&self.queued).pop_front();
        queued.unwrap_or_else(|| self.default_result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> ChatRequest {
        ChatRequest::new(vec![ChatMessage::system("rules"), ChatMessage::user("doc")])
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.complete(&request()).await;
        assert_eq!(result.unwrap(), RawResponse::Text("Test response".to_string()));
    }

    #[tokio::test]
    async fn test_mock_provider_structured() {
        let provider = MockProvider::new(json!({"tags": ["#a"]}));
        let result = provider.complete(&request()).await.unwrap();
        assert_eq!(result.as_structured().unwrap()["tags"][0], "#a");
    }

    #[tokio::test]
    async fn test_mock_provider_queue_then_default() {
        let provider = MockProvider::new("default");
        provider.push_response("first");
        provider.push_error(LlmError::Timeout);

        assert_eq!(
            provider.complete(&request()).await.unwrap(),
            RawResponse::from("first")
        );
        assert_eq!(provider.complete(&request()).await, Err(LlmError::Timeout));
        assert_eq!(
            provider.complete(&request()).await.unwrap(),
            RawResponse::from("default")
        );
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::default();
        assert_eq!(provider.call_count(), 0);

        provider.complete(&request()).await.unwrap();
        provider.complete(&request()).await.unwrap();
        assert_eq!(provider.call_count(), 2);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_records_last_request() {
        let provider = MockProvider::default();
        assert!(provider.last_request().is_none());

        provider.complete(&request()).await.unwrap();
        let seen = provider.last_request().unwrap();
        assert_eq!(seen.system_text(), "rules");
        assert_eq!(seen.user_text(), "doc");
    }

    #[tokio::test]
    async fn test_mock_provider_clones_share_state() {
        let provider = MockProvider::default();
        let clone = provider.clone();
        clone.complete(&request()).await.unwrap();
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_mock_provider_structured_support_follows_provider() {
        assert!(MockProvider::default().supports_structured());
        assert!(!MockProvider::default()
            .with_provider(Provider::Ollama)
            .supports_structured());
        assert!(!MockProvider::default()
            .with_provider(Provider::GoogleGenAi)
            .supports_structured());
    }

    #[test]
    fn test_connect_dispatches_on_provider() {
        let cases = [
            (Provider::OpenAi, "gpt-4o-mini"),
            (Provider::MistralAi, "mistral-small-latest"),
            (Provider::Groq, "llama-3.1-8b-instant"),
            (Provider::Anthropic, "claude-3-5-haiku-latest"),
            (Provider::GoogleGenAi, "gemini-1.5-flash"),
            (Provider::Ollama, "llama3.2"),
        ];
        for (provider, model) in cases {
            let descriptor = BackendDescriptor::new(provider, model, 8_000)
                .with_credential("key".to_string());
            let backend = connect(&descriptor).unwrap();
            assert_eq!(backend.provider(), provider);
            assert_eq!(backend.model(), model);
        }
    }

    #[test]
    fn test_connect_rejects_bad_custom_endpoint() {
        let descriptor = BackendDescriptor::new(Provider::OpenAi, "gpt-4o-mini", 8_000)
            .with_custom_endpoint("not a url".to_string());
        assert!(matches!(
            connect(&descriptor),
            Err(LlmError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_connectivity_errors() {
        assert!(LlmError::Timeout.is_connectivity());
        assert!(LlmError::Unreachable("refused".into()).is_connectivity());
        assert!(LlmError::CrossOriginBlocked("cors".into()).is_connectivity());
        assert!(!LlmError::Unauthorized("401".into()).is_connectivity());
        assert!(!LlmError::RateLimitExceeded.is_connectivity());
    }
}
