//! Configuration for the Tagger
//!
//! `TaggerConfig` is the on-disk shape (TOML). `resolve` validates it once and
//! produces an immutable `TaggerSettings` snapshot that the pipeline uses.
//!
//! ```toml
//! provider = "anthropic"
//! model = "claude-3-5-haiku-latest"
//! allowed_tags = ["#rust", "#async", "#testing"]
//! lowercase_mode = true
//!
//! [api_keys]
//! anthropic = "sk-ant-..."
//! ```

use crate::error::ConfigurationError;
use crate::prompt::SystemInstruction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use taxotag_domain::{BackendDescriptor, Provider, TagMode, Vocabulary};
use tracing::debug;

/// Settings as stored in a TOML file
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Provider name ("openai", "mistralai", "anthropic", "groq", "googlegenai", "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Context window of the model, in tokens
    pub token_limit: usize,

    /// Allowed tags, each starting with `#`
    pub allowed_tags: Vec<String>,

    /// Emit tags lowercased
    pub lowercase_mode: bool,

    /// Use `custom_system_prompt` instead of the built-in instruction
    pub use_custom_system_prompt: bool,

    /// Instruction text used when `use_custom_system_prompt` is set
    pub custom_system_prompt: String,

    /// Send requests to `custom_base_url` instead of the provider default
    pub use_custom_base_url: bool,

    /// Proxy or emulator base URL
    pub custom_base_url: String,

    /// API keys by provider name
    pub api_keys: BTreeMap<String, String>,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi.as_str().to_string(),
            model: "gpt-4o-mini".to_string(),
            token_limit: 128_000,
            allowed_tags: Vec::new(),
            lowercase_mode: false,
            use_custom_system_prompt: false,
            custom_system_prompt: String::new(),
            use_custom_base_url: false,
            custom_base_url: String::new(),
            api_keys: BTreeMap::new(),
        }
    }
}

// API keys are shown by provider name only.
impl fmt::Debug for TaggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggerConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("token_limit", &self.token_limit)
            .field("allowed_tags", &self.allowed_tags)
            .field("lowercase_mode", &self.lowercase_mode)
            .field("use_custom_system_prompt", &self.use_custom_system_prompt)
            .field("use_custom_base_url", &self.use_custom_base_url)
            .field("custom_base_url", &self.custom_base_url)
            .field("api_keys", &self.api_keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TaggerConfig {
    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigurationError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigurationError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        debug!("Loading tagger configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Validate and snapshot, falling back to environment variables for keys
    pub fn resolve(&self) -> Result<TaggerSettings, ConfigurationError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Validate and snapshot, looking up missing keys through `env`
    ///
    /// A missing key is not an error here; the tagger reports it before its
    /// first request so the message can be classified.
    pub fn resolve_with<F>(&self, env: F) -> Result<TaggerSettings, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = parse_provider(&self.provider)?;

        let model = self.model.trim();
        if model.is_empty() {
            return Err(ConfigurationError::Invalid(
                "model must not be empty".to_string(),
            ));
        }
        if self.token_limit == 0 {
            return Err(ConfigurationError::Invalid(
                "token_limit must be greater than 0".to_string(),
            ));
        }

        let keys = self.credentials()?;
        let credential = keys.get(&provider).cloned().or_else(|| {
            provider
                .credential_env_var()
                .and_then(|var| env(var))
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty())
        });

        let mut backend = BackendDescriptor::new(provider, model, self.token_limit);
        if let Some(key) = credential {
            backend = backend.with_credential(key);
        }

        if self.use_custom_base_url {
            let url = self.custom_base_url.trim();
            if url.is_empty() {
                return Err(ConfigurationError::MissingEndpoint);
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigurationError::InvalidEndpoint(url.to_string()));
            }
            backend = backend.with_custom_endpoint(url);
        }

        let instruction = if self.use_custom_system_prompt {
            let text = self.custom_system_prompt.trim();
            if text.is_empty() {
                return Err(ConfigurationError::Invalid(
                    "custom system prompt is enabled but empty".to_string(),
                ));
            }
            SystemInstruction::Custom(text.to_string())
        } else {
            SystemInstruction::Default
        };

        Ok(TaggerSettings {
            vocabulary: Vocabulary::new(&self.allowed_tags),
            backend,
            mode: TagMode {
                lowercase: self.lowercase_mode,
            },
            instruction,
        })
    }

    /// Keys by provider, rejecting unknown provider names
    fn credentials(&self) -> Result<HashMap<Provider, String>, ConfigurationError> {
        let mut keys = HashMap::new();
        for (name, key) in &self.api_keys {
            let provider = parse_provider(name)?;
            let key = key.trim();
            if !key.is_empty() {
                keys.insert(provider, key.to_string());
            }
        }
        Ok(keys)
    }
}

fn parse_provider(name: &str) -> Result<Provider, ConfigurationError> {
    Provider::parse(name).ok_or_else(|| ConfigurationError::UnknownProvider(name.to_string()))
}

/// Validated, immutable inputs for one tagger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggerSettings {
    /// Allowed tags
    pub vocabulary: Vocabulary,
    /// Backend to call
    pub backend: BackendDescriptor,
    /// Output flags
    pub mode: TagMode,
    /// Instruction heading the system message
    pub instruction: SystemInstruction,
}

impl TaggerSettings {
    /// Settings with the default instruction and mode
    pub fn new(vocabulary: Vocabulary, backend: BackendDescriptor) -> Self {
        Self {
            vocabulary,
            backend,
            mode: TagMode::default(),
            instruction: SystemInstruction::Default,
        }
    }

    /// Set the output mode
    pub fn with_mode(mut self, mode: TagMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the instruction
    pub fn with_instruction(mut self, instruction: SystemInstruction) -> Self {
        self.instruction = instruction;
        self
    }
}
