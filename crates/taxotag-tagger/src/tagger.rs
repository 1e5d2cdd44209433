//! Core Tagger implementation

use crate::classifier::{classify, TaggingFailure};
use crate::config::TaggerSettings;
use crate::error::{ConfigurationError, Stage, TaggerError};
use crate::parser::parse_response;
use crate::prompt::{estimate_tokens, tag_tool_schema, PromptBuilder};
use crate::validator::TagValidator;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use taxotag_domain::DocumentInput;
use taxotag_llm::{connect, ChatModel, ChatRequest, LlmError, RawResponse, DEFAULT_TIMEOUT_SECS};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Picks five tags from a closed vocabulary for a document
///
/// Holds an immutable settings snapshot and a shared backend. Every call is a
/// single stateless request; concurrent calls need no locking.
pub struct Tagger {
    settings: TaggerSettings,
    model: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl Tagger {
    /// Create a Tagger talking to the backend described by `settings`
    pub fn new(settings: TaggerSettings) -> Result<Self, ConfigurationError> {
        let model = connect(&settings.backend).map_err(|e| match e {
            LlmError::InvalidEndpoint(url) => ConfigurationError::InvalidEndpoint(url),
            other => ConfigurationError::Invalid(other.to_string()),
        })?;
        Ok(Self::with_model(settings, model))
    }

    /// Create a Tagger using an already-built backend
    pub fn with_model(settings: TaggerSettings, model: Arc<dyn ChatModel>) -> Self {
        Self {
            settings,
            model,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the ceiling on a single backend call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The settings snapshot in use
    pub fn settings(&self) -> &TaggerSettings {
        &self.settings
    }

    /// Generate exactly five new tags for a document
    ///
    /// Fails fast, without contacting the backend, when the vocabulary is
    /// empty, a required API key is missing, or the prompt exceeds the
    /// model's token limit.
    pub async fn generate_tags(
        &self,
        document_text: &str,
        existing_tags: &[String],
    ) -> Result<Vec<String>, TaggingFailure> {
        self.run(document_text, existing_tags)
            .await
            .map_err(|(stage, error)| {
                let failure = classify(error, stage, &self.settings.backend);
                warn!(
                    "Tag generation stopped at {} stage: {}",
                    failure.stage(),
                    failure.message()
                );
                failure
            })
    }

    /// Tag several documents concurrently; results keep the input order
    pub async fn generate_tags_for_all(
        &self,
        documents: &[DocumentInput],
    ) -> Vec<Result<Vec<String>, TaggingFailure>> {
        info!("Tagging {} documents", documents.len());
        join_all(
            documents
                .iter()
                .map(|doc| self.generate_tags(&doc.text, &doc.existing_tags)),
        )
        .await
    }

    async fn run(
        &self,
        document_text: &str,
        existing_tags: &[String],
    ) -> Result<Vec<String>, (Stage, TaggerError)> {
        let request = self.build(document_text).map_err(|e| (Stage::Built, e))?;

        let response = self
            .invoke(&request)
            .await
            .map_err(|e| (Stage::Invoked, TaggerError::Transport(e)))?;

        let candidates = parse_response(&response).map_err(|e| (Stage::Parsed, e))?;

        let tags = TagValidator::new(&self.settings.vocabulary, self.settings.mode)
            .validate(&candidates, existing_tags)
            .map_err(|e| (Stage::Validated, TaggerError::Validation(e)))?;

        info!("Generated tags: {}", tags.join(", "));
        Ok(tags)
    }

    /// Check preconditions and assemble the request
    fn build(&self, document_text: &str) -> Result<ChatRequest, TaggerError> {
        let backend = &self.settings.backend;
        if backend.is_missing_credential() {
            return Err(ConfigurationError::MissingCredential {
                provider: backend.provider,
            }
            .into());
        }

        let mut request = PromptBuilder::new(&self.settings.instruction, &self.settings.vocabulary)
            .build(document_text)?;
        if self.model.supports_structured() {
            request = request.with_tool(tag_tool_schema());
        }

        let estimated = estimate_tokens(&request);
        debug!(
            "Prompt size: ~{} tokens (limit {})",
            estimated, backend.token_limit
        );
        if estimated > backend.token_limit {
            return Err(TaggerError::DocumentTooLong {
                estimated,
                limit: backend.token_limit,
            });
        }

        Ok(request)
    }

    async fn invoke(&self, request: &ChatRequest) -> Result<RawResponse, LlmError> {
        info!(
            "Requesting tags from {} model '{}' ({} allowed tags, {})",
            self.model.provider(),
            self.model.model(),
            self.settings.vocabulary.len(),
            if request.tool.is_some() {
                "structured"
            } else {
                "free-form"
            }
        );

        timeout(self.timeout, self.model.complete(request))
            .await
            .map_err(|_| LlmError::Timeout)?
    }
}
