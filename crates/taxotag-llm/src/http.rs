//! Shared HTTP plumbing for the remote providers
//!
//! Every provider posts JSON and gets JSON back; what differs is the path,
//! the auth header, and the body shape. This module owns the client, the
//! timeout, and the mapping from HTTP failures to typed `LlmError`s.

use crate::LlmError;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default timeout for a single model request (10 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Longest error body kept in an error message
const MAX_ERROR_BODY: usize = 300;

/// Client, base URL and API key for one backend
#[derive(Clone)]
pub(crate) struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Create a transport for `endpoint`
    ///
    /// Fails with `InvalidEndpoint` if the URL does not parse.
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let endpoint = endpoint.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&endpoint)
            .map_err(|e| LlmError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Unknown(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Rebuild the client with a different timeout
    pub fn with_timeout(self, timeout: Duration) -> Result<Self, LlmError> {
        Self::new(&self.endpoint, self.api_key, timeout)
    }

    /// Base URL, without trailing slash
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The configured API key, if any
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Start a POST to `path` relative to the base URL
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.endpoint, path.trim_start_matches('/'));
        debug!("POST {}", url);
        self.client.post(url)
    }

    /// Send a JSON body and decode the JSON reply
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        request: reqwest::RequestBuilder,
        body: &B,
        model: &str,
    ) -> Result<Value, LlmError> {
        let response = request
            .json(body)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::from_status(status.as_u16(), &text, model));
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
            }
        })
    }
}

impl LlmError {
    /// Classify a failure to get any HTTP response at all
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return LlmError::Timeout;
        }
        let message = error_chain(&error);
        if mentions_cors(&message) {
            LlmError::CrossOriginBlocked(message)
        } else if error.is_connect() {
            LlmError::Unreachable(message)
        } else {
            LlmError::Unknown(message)
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: &str, model: &str) -> Self {
        let body = truncate(body.trim(), MAX_ERROR_BODY);
        if mentions_cors(&body) {
            return LlmError::CrossOriginBlocked(format!("HTTP {}: {}", status, body));
        }
        match status {
            401 | 403 => LlmError::Unauthorized(format!("HTTP {}: {}", status, body)),
            404 => LlmError::ModelNotAvailable(model.to_string()),
            429 => LlmError::RateLimitExceeded,
            _ => LlmError::Http { status, body },
        }
    }
}

fn mentions_cors(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("cors") || lower.contains("access-control")
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
