//! Raw model output, before any interpretation

use serde_json::Value;

/// Untyped payload returned by a backend
///
/// Providers hand back whatever carries the answer: a message object that may
/// hold a tool call, a bare JSON body, or plain text. Interpreting it is the
/// caller's job.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// A JSON payload (message object, tool call, or arbitrary body)
    Structured(Value),
    /// Plain text
    Text(String),
}

impl RawResponse {
    /// The JSON payload, if this is a structured response
    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            RawResponse::Structured(value) => Some(value),
            RawResponse::Text(_) => None,
        }
    }
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        RawResponse::Structured(value)
    }
}

impl From<String> for RawResponse {
    fn from(text: String) -> Self {
        RawResponse::Text(text)
    }
}

impl From<&str> for RawResponse {
    fn from(text: &str) -> Self {
        RawResponse::Text(text.to_string())
    }
}
