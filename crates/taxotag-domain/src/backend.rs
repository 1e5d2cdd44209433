//! Backend module - which model to talk to, and how

use crate::Provider;
use std::fmt;

/// Identifies a concrete model backend
///
/// Supplied by configuration and treated as read-only by the pipeline.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    /// Provider the model belongs to
    pub provider: Provider,

    /// Provider-specific model identifier (e.g. "gpt-4o-mini")
    pub model: String,

    /// Context window of the model, in tokens
    pub token_limit: usize,

    /// Custom base URL replacing the provider default (proxy, emulator)
    pub custom_endpoint: Option<String>,

    /// API key for the provider
    pub credential: Option<String>,
}

impl BackendDescriptor {
    /// Create a descriptor with no custom endpoint and no credential
    pub fn new(provider: Provider, model: impl Into<String>, token_limit: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            token_limit,
            custom_endpoint: None,
            credential: None,
        }
    }

    /// Set the API key
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Route requests through a custom base URL
    pub fn with_custom_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.custom_endpoint = Some(endpoint.into());
        self
    }

    /// Base URL requests go to, without a trailing slash
    pub fn endpoint(&self) -> &str {
        self.custom_endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
            .trim_end_matches('/')
    }

    /// Whether a custom endpoint overrides the provider default
    pub fn has_custom_endpoint(&self) -> bool {
        self.custom_endpoint.is_some()
    }

    /// Whether the provider needs a key and none is set
    pub fn is_missing_credential(&self) -> bool {
        self.provider.requires_credential()
            && self.credential.as_deref().map_or(true, |c| c.trim().is_empty())
    }
}

// Keeps API keys out of logs and panic messages.
impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("token_limit", &self.token_limit)
            .field("custom_endpoint", &self.custom_endpoint)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Output mode flags applied to validated tags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagMode {
    /// Emit every tag lowercased
    pub lowercase: bool,
}

impl TagMode {
    /// Apply the mode to a validated tag
    pub fn apply(&self, tag: &str) -> String {
        if self.lowercase {
            tag.to_lowercase()
        } else {
            tag.to_string()
        }
    }
}
