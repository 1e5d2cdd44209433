//! Anthropic messages API

use crate::http::{HttpTransport, DEFAULT_TIMEOUT_SECS};
use crate::{ChatModel, ChatRequest, LlmError, RawResponse};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use taxotag_domain::Provider;

/// API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

const MAX_TOKENS: u32 = 500;

/// Provider for Anthropic's `/v1/messages` endpoint
///
/// Structured invocation uses a forced `tool_use`; the reply body is returned
/// as-is, so callers see the content blocks (`text` or `tool_use`).
#[derive(Clone)]
pub struct AnthropicProvider {
    model: String,
    transport: HttpTransport,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

impl AnthropicProvider {
    /// Create a provider talking to `endpoint` (e.g. "https://api.anthropic.com")
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

    fn body<'a>(&'a self, request: &ChatRequest) -> MessagesRequest<'a> {
        let (tools, tool_choice) = match &request.tool {
            Some(tool) => (
                Some(vec![json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": tool.parameters,
                })]),
                Some(json!({ "type": "tool", "name": tool.name })),
            ),
            None => (None, None),
        };

        MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system: request.system_text(),
            messages: vec![json!({ "role": "user", "content": request.user_text() })],
            tools,
            tool_choice,
        }
    }
}

#[async_trait]
impl ChatModel for AnthropicProvider {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<RawResponse, LlmError> {
        let body = self.body(request);

        let mut http = self
            .transport
            .post("v1/messages")
            .header("anthropic-version", ANTHROPIC_VERSION);
        if let Some(key) = self.transport.api_key() {
            http = http.header("x-api-key", key);
        }

        let reply = self.transport.send_json(http, &body, &self.model).await?;
        Ok(RawResponse::Structured(reply))
    }
}
