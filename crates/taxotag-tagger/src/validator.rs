//! Enforce the result invariants on candidate tags

use crate::error::ValidationError;
use taxotag_domain::marker::{ensure_marker, eq_ignore_case};
use taxotag_domain::{TagMode, Vocabulary, TAG_COUNT};
use tracing::warn;

/// Checks candidates against the vocabulary and the document's existing tags
pub struct TagValidator<'a> {
    vocabulary: &'a Vocabulary,
    mode: TagMode,
}

impl<'a> TagValidator<'a> {
    /// Create a validator for `vocabulary`, emitting tags per `mode`
    pub fn new(vocabulary: &'a Vocabulary, mode: TagMode) -> Self {
        Self { vocabulary, mode }
    }

    /// Turn candidates into exactly five new tags, or explain why not
    ///
    /// Candidates are marker-normalized, matched case-insensitively against
    /// the vocabulary (keeping its spelling), and de-duplicated. Exactly five
    /// must survive, and all five must be new to the document. The model's
    /// order is kept.
    pub fn validate(
        &self,
        candidates: &[String],
        existing_tags: &[String],
    ) -> Result<Vec<String>, ValidationError> {
        let mut accepted: Vec<&str> = Vec::with_capacity(TAG_COUNT);

        for candidate in candidates {
            let normalized = ensure_marker(candidate);
            let Some(canonical) = self.vocabulary.canonical(&normalized) else {
                warn!("Dropping tag outside the vocabulary: {}", normalized);
                continue;
            };
            if accepted.iter().any(|seen| eq_ignore_case(seen, canonical)) {
                continue;
            }
            accepted.push(canonical);
        }

        if accepted.len() > TAG_COUNT {
            return Err(ValidationError::TooMany {
                found: accepted.len(),
            });
        }
        if accepted.len() < TAG_COUNT {
            return Err(ValidationError::OutsideVocabulary {
                valid: accepted.len(),
            });
        }

        let fresh: Vec<&str> = accepted
            .into_iter()
            .filter(|tag| !existing_tags.iter().any(|old| eq_ignore_case(old, tag)))
            .collect();

        if fresh.len() < TAG_COUNT {
            return Err(ValidationError::AlreadyPresent { valid: fresh.len() });
        }

        Ok(fresh.into_iter().map(|tag| self.mode.apply(tag)).collect())
    }
}
