//! Provider-neutral request types

use serde::Serialize;
use serde_json::Value;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model
    System,
    /// The end-user turn
    User,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Who is speaking
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A callable the model can be forced to invoke
///
/// `parameters` is a JSON Schema object describing the call's arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSchema {
    /// Function name
    pub name: String,
    /// What the function does, shown to the model
    pub description: String,
    /// JSON Schema for the arguments
    pub parameters: Value,
}

/// One stateless request to a model
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Ordered messages, system first
    pub messages: Vec<ChatMessage>,
    /// Tool the model must call, for structured invocation
    pub tool: Option<ToolSchema>,
}

impl ChatRequest {
    /// Create a free-form request
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            tool: None,
        }
    }

    /// Force the model to answer through `tool`
    pub fn with_tool(mut self, tool: ToolSchema) -> Self {
        self.tool = Some(tool);
        self
    }

    /// Concatenated system messages
    pub fn system_text(&self) -> String {
        self.messages_with(Role::System)
    }

    /// Concatenated user messages
    pub fn user_text(&self) -> String {
        self.messages_with(Role::User)
    }

    /// Total characters across all messages
    pub fn char_count(&self) -> usize {
        self.messages.iter().map(|m| m.content.chars().count()).sum()
    }

    fn messages_with(&self, role: Role) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == role)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
