//! Google Gemini `generateContent`

use crate::http::{HttpTransport, DEFAULT_TIMEOUT_SECS};
use crate::{ChatModel, ChatRequest, LlmError, RawResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use taxotag_domain::Provider;

/// Provider for the Gemini API (free-form invocation only)
#[derive(Clone)]
pub struct GeminiProvider {
    model: String,
    transport: HttpTransport,
}

impl GeminiProvider {
    /// Create a provider talking to `endpoint`
    /// (e.g. "https://generativelanguage.googleapis.com/v1beta")
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            model: model.into(),
            transport: HttpTransport::new(
                endpoint,
                api_key,
                Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            )?,
        })
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.transport = self.transport.with_timeout(timeout)?;
        Ok(self)
    }

    fn body(request: &ChatRequest) -> Value {
        json!({
            "systemInstruction": { "parts": [{ "text": request.system_text() }] },
            "contents": [{ "role": "user", "parts": [{ "text": request.user_text() }] }],
            "generationConfig": { "temperature": 0, "maxOutputTokens": 500 },
        })
    }
}

/// Join the text parts of the first candidate
fn candidate_text(reply: &Value) -> Option<String> {
    let parts = reply
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(text.join("\n"))
    }
}

#[async_trait]
impl ChatModel for GeminiProvider {
    fn provider(&self) -> Provider {
        Provider::GoogleGenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<RawResponse, LlmError> {
        let mut http = self
            .transport
            .post(&format!("models/{}:generateContent", self.model));
        if let Some(key) = self.transport.api_key() {
            http = http.header("x-goog-api-key", key);
        }

        let reply = self
            .transport
            .send_json(http, &Self::body(request), &self.model)
            .await?;

        Ok(match candidate_text(&reply) {
            Some(text) => RawResponse::Text(text),
            None => RawResponse::Structured(reply),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_text_joins_parts() {
        let reply = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "#a, #b" }, { "text": "#c" }] }
            }]
        });
        assert_eq!(candidate_text(&reply).as_deref(), Some("#a, #b\n#c"));
    }

    #[test]
    fn test_candidate_text_missing() {
        assert!(candidate_text(&json!({ "promptFeedback": {} })).is_none());
        assert!(candidate_text(&json!({ "candidates": [] })).is_none());
    }

    #[test]
    fn test_never_structured() {
        let provider = GeminiProvider::new(
            "https://generativelanguage.googleapis.com/v1beta",
            "gemini-1.5-flash",
            None,
        )
        .unwrap();
        assert!(!provider.supports_structured());
    }
}
