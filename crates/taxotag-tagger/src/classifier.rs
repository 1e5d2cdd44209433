//! Turn pipeline errors into one actionable message
//!
//! Rules are checked in priority order and the first match wins:
//!
//! 1. missing or rejected API key
//! 2. local provider (Ollama) failed at transport level
//! 3. connectivity failure while a custom base URL is set
//! 4. any other transport failure while a custom base URL is set
//! 5. configuration errors verbatim, everything else as a generic failure

use crate::error::{ConfigurationError, ErrorCategory, Stage, TaggerError};
use taxotag_domain::BackendDescriptor;
use taxotag_llm::LlmError;
use thiserror::Error;

/// Which rule produced a failure's message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// API key missing or rejected
    CredentialRequired,
    /// Local service down or model not installed
    LocalServiceUnavailable,
    /// Custom base URL does not speak this model's API
    CustomEndpointIncompatible,
    /// Custom base URL set where it probably should not be
    CustomEndpointMisconfigured,
    /// Other configuration problem, reported as-is
    Configuration,
    /// Anything else
    Generic,
}

/// The caller-facing error of a tagging run
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TaggingFailure {
    kind: FailureKind,
    stage: Stage,
    message: String,
    #[source]
    cause: TaggerError,
}

impl TaggingFailure {
    /// Which rule matched
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// The stage the pipeline stopped at
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying pipeline error
    pub fn cause(&self) -> &TaggerError {
        &self.cause
    }
}

/// Classify `error`, raised at `stage` while using `backend`
pub fn classify(error: TaggerError, stage: Stage, backend: &BackendDescriptor) -> TaggingFailure {
    let company = backend.provider.company();

    let (kind, message) = match &error {
        TaggerError::Configuration(ConfigurationError::MissingCredential { .. }) => (
            FailureKind::CredentialRequired,
            format!(
                "API key is not configured. Add your {} API key in the settings",
                company
            ),
        ),
        TaggerError::Transport(LlmError::Unauthorized(_)) => (
            FailureKind::CredentialRequired,
            format!(
                "{} rejected the API key. Configure a valid API key in the settings",
                company
            ),
        ),
        TaggerError::Transport(_) if backend.provider.is_local() => (
            FailureKind::LocalServiceUnavailable,
            format!(
                "Check that {} is running at {} and that model '{}' is installed",
                company,
                backend.endpoint(),
                backend.model
            ),
        ),
        TaggerError::Transport(e) if backend.has_custom_endpoint() && e.is_connectivity() => (
            FailureKind::CustomEndpointIncompatible,
            format!(
                "Custom base URL {} may not be supported by {} {}: {}",
                backend.endpoint(),
                company,
                backend.model,
                e
            ),
        ),
        TaggerError::Transport(e) if backend.has_custom_endpoint() => (
            FailureKind::CustomEndpointMisconfigured,
            format!(
                "A custom base URL is set; remove it unless you use a proxy or service emulator ({})",
                e
            ),
        ),
        e if e.category() == ErrorCategory::Configuration => {
            (FailureKind::Configuration, e.to_string())
        }
        e => (FailureKind::Generic, format!("Tag generation failed: {}", e)),
    };

    TaggingFailure {
        kind,
        stage,
        message,
        cause: error,
    }
}
