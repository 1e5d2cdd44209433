//! Error types for the Tagger

use taxotag_domain::{Provider, TAG_COUNT};
use taxotag_llm::LlmError;
use thiserror::Error;

/// Problems with the settings a tagger was given
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// No allowed tags configured
    #[error("No allowed tags configured. Add at least one tag to the vocabulary")]
    EmptyVocabulary,

    /// Provider needs an API key and none was found
    #[error("API key is not configured for {}. Add it to the settings", .provider.company())]
    MissingCredential {
        /// Provider lacking a key
        provider: Provider,
    },

    /// Custom base URL enabled but left blank
    #[error("Custom base URL is enabled but empty")]
    MissingEndpoint,

    /// Base URL does not parse
    #[error("Invalid base URL: {0}")]
    InvalidEndpoint(String),

    /// Provider name not recognized
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Any other rejected setting
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// TOML could not be parsed
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML could not be produced
    #[error("Failed to serialize to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Settings file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// The model's tags did not survive validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Too few candidates were vocabulary members
    #[error("only {valid} of {total} tags valid", total = TAG_COUNT)]
    OutsideVocabulary {
        /// Distinct vocabulary members found
        valid: usize,
    },

    /// Enough members, but some are already on the document
    #[error("only {valid} of {total} tags valid after removing tags the document already has", total = TAG_COUNT)]
    AlreadyPresent {
        /// Members left after removing existing tags
        valid: usize,
    },

    /// More distinct members than a result may hold
    #[error("expected {total} tags, got {found} valid tags", total = TAG_COUNT)]
    TooMany {
        /// Distinct vocabulary members found
        found: usize,
    },
}

impl ValidationError {
    /// Number of distinct tags the failed attempt kept at the step that failed
    ///
    /// Below five for the shortfall variants, above five for `TooMany`.
    pub fn tag_count(&self) -> usize {
        match self {
            ValidationError::OutsideVocabulary { valid } => *valid,
            ValidationError::AlreadyPresent { valid } => *valid,
            ValidationError::TooMany { found } => *found,
        }
    }
}

/// Errors that can occur while generating tags
#[derive(Error, Debug)]
pub enum TaggerError {
    /// Settings were unusable
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The backend call failed
    #[error(transparent)]
    Transport(#[from] LlmError),

    /// The reply held no recognizable tags
    #[error("{0}")]
    Parse(String),

    /// The tags broke a result invariant
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Prompt exceeds the model's token limit
    #[error("Document too long: about {estimated} tokens (limit: {limit})")]
    DocumentTooLong {
        /// Estimated prompt tokens
        estimated: usize,
        /// Configured limit
        limit: usize,
    },
}

impl TaggerError {
    /// Coarse category for callers that only branch on the kind of failure
    pub fn category(&self) -> ErrorCategory {
        match self {
            TaggerError::Configuration(_) | TaggerError::DocumentTooLong { .. } => {
                ErrorCategory::Configuration
            }
            TaggerError::Transport(_) => ErrorCategory::Transport,
            TaggerError::Parse(_) => ErrorCategory::Parse,
            TaggerError::Validation(_) => ErrorCategory::Validation,
        }
    }
}

/// Error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or invalid settings; nothing was sent
    Configuration,
    /// The backend could not be reached or refused the request
    Transport,
    /// The reply could not be interpreted
    Parse,
    /// The reply did not yield a valid tag set
    Validation,
}

/// Pipeline stages, in order
///
/// A run moves `Built → Invoked → Parsed → Validated → Done` with no
/// retries. A failure names the stage that did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Preconditions checked and request assembled
    Built,
    /// Backend called
    Invoked,
    /// Reply turned into candidate tags
    Parsed,
    /// Candidates checked against the vocabulary
    Validated,
    /// Tags ready
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Built => "build",
            Stage::Invoked => "invoke",
            Stage::Parsed => "parse",
            Stage::Validated => "validate",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}
