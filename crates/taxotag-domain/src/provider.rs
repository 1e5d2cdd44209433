//! Provider module - the model services a backend can belong to

use std::fmt;

/// A language-model provider
///
/// Each provider fixes how the backend is reached and what it can do:
/// default endpoint, credential requirement, and whether it supports
/// forced tool calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// OpenAI chat completions
    OpenAi,

    /// Mistral AI (OpenAI-compatible chat completions)
    MistralAi,

    /// Anthropic messages API
    Anthropic,

    /// Groq (OpenAI-compatible chat completions)
    Groq,

    /// Google Gemini
    GoogleGenAi,

    /// Ollama, self-hosted
    Ollama,
}

impl Provider {
    /// All known providers
    pub const ALL: [Provider; 6] = [
        Provider::OpenAi,
        Provider::MistralAi,
        Provider::Anthropic,
        Provider::Groq,
        Provider::GoogleGenAi,
        Provider::Ollama,
    ];

    /// Get the provider identifier as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::MistralAi => "mistralai",
            Provider::Anthropic => "anthropic",
            Provider::Groq => "groq",
            Provider::GoogleGenAi => "googlegenai",
            Provider::Ollama => "ollama",
        }
    }

    /// Parse a provider from its identifier (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }

    /// Human-readable company name
    pub fn company(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::MistralAi => "Mistral AI",
            Provider::Anthropic => "Anthropic",
            Provider::Groq => "Groq",
            Provider::GoogleGenAi => "Google",
            Provider::Ollama => "Ollama",
        }
    }

    /// Base URL used when no custom endpoint is configured
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::MistralAi => "https://api.mistral.ai/v1",
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::GoogleGenAi => "https://generativelanguage.googleapis.com/v1beta",
            Provider::Ollama => "http://localhost:11434",
        }
    }

    /// Whether requests must carry an API key
    pub fn requires_credential(&self) -> bool {
        !self.is_local()
    }

    /// Whether the provider runs on the user's own machine
    pub fn is_local(&self) -> bool {
        matches!(self, Provider::Ollama)
    }

    /// Whether the backend can be forced to call a declared tool
    pub fn supports_structured_invocation(&self) -> bool {
        matches!(
            self,
            Provider::OpenAi | Provider::MistralAi | Provider::Groq | Provider::Anthropic
        )
    }

    /// Environment variable consulted when no API key is configured
    pub fn credential_env_var(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::MistralAi => Some("MISTRAL_API_KEY"),
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::Groq => Some("GROQ_API_KEY"),
            Provider::GoogleGenAi => Some("GOOGLE_API_KEY"),
            Provider::Ollama => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
