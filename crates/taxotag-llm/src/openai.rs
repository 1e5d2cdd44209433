//! OpenAI-compatible chat completions
//!
//! Serves OpenAI itself plus every provider (and proxy) that speaks the same
//! `/chat/completions` dialect: Mistral AI, Groq, or a custom base URL.
//!
//! When the request carries a tool, it is sent as the only tool and the
//! model is forced to call it; the reply's message then holds `tool_calls`
//! with JSON-encoded arguments.

use crate::http::{HttpTransport, DEFAULT_TIMEOUT_SECS};
use crate::{ChatMessage, ChatModel, ChatRequest, LlmError, RawResponse, ToolSchema};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use taxotag_domain::Provider;

/// Completion budget; five tags never need more
const MAX_TOKENS: u32 = 500;

/// Provider for OpenAI-compatible chat completion endpoints
#[derive(Clone)]
pub struct OpenAiProvider {
    provider: Provider,
    model: String,
    transport: HttpTransport,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

impl OpenAiProvider {
    /// Create a provider talking to `endpoint`
    ///
    /// # Parameters
    ///
    /// - `provider`: which service the endpoint belongs to
    /// - `endpoint`: base URL, e.g. "https://api.openai.com/v1"
    /// - `model`: model identifier, e.g. "gpt-4o-mini"
    /// - `api_key`: bearer token, if the endpoint needs one
    pub fn new(
        provider: Provider,
        endpoint: &str,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            provider,
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

    fn tool_fields(tool: &ToolSchema) -> (Vec<Value>, Value) {
        let tools = vec![json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        })];
        let choice = json!({
            "type": "function",
            "function": { "name": tool.name }
        });
        (tools, choice)
    }
}

#[async_trait]
impl ChatModel for OpenAiProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<RawResponse, LlmError> {
        let (tools, tool_choice) = match &request.tool {
            Some(tool) => {
                let (tools, choice) = Self::tool_fields(tool);
                (Some(tools), Some(choice))
            }
            None => (None, None),
        };

        let body = CompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: 0.0,
            max_tokens: MAX_TOKENS,
            tools,
            tool_choice,
        };

        let mut http = self.transport.post("chat/completions");
        if let Some(key) = self.transport.api_key() {
            http = http.bearer_auth(key);
        }

        let mut reply = self.transport.send_json(http, &body, &self.model).await?;

        // The answer lives in the first choice's message; bodies without
        // choices (some proxies) are passed through untouched.
        let message = reply
            .get_mut("choices")
            .and_then(Value::as_array_mut)
            .and_then(|choices| choices.first_mut())
            .and_then(|choice| choice.get_mut("message"))
            .map(Value::take);

        Ok(RawResponse::Structured(message.unwrap_or(reply)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new(
            Provider::Groq,
            "https://api.groq.com/openai/v1",
            "llama-3.1-8b-instant",
            Some("gsk".to_string()),
        )
        .unwrap();
        assert_eq!(provider.provider(), Provider::Groq);
        assert_eq!(provider.model(), "llama-3.1-8b-instant");
        assert!(provider.supports_structured());
    }

    #[test]
    fn test_tool_fields_force_the_named_function() {
        let tool = ToolSchema {
            name: "generate_tags".to_string(),
            description: "pick tags".to_string(),
            parameters: json!({"type": "object"}),
        };
        let (tools, choice) = OpenAiProvider::tool_fields(&tool);
        assert_eq!(tools[0]["function"]["name"], "generate_tags");
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(choice["function"]["name"], "generate_tags");
    }

    #[test]
    fn test_request_omits_tools_when_free_form() {
        let messages = vec![ChatMessage::user("hi")];
        let body = CompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.0,
            max_tokens: MAX_TOKENS,
            tools: None,
            tool_choice: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("tools").is_none());
        assert!(json.get("tool_choice").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
