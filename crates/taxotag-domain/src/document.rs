//! Document module - the caller-supplied input to one tagging run

/// A document to tag: its text plus the tags it already carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInput {
    /// Document text
    pub text: String,

    /// Tags already attached to the document, in host order
    pub existing_tags: Vec<String>,
}

impl DocumentInput {
    /// Create a new document input
    pub fn new(text: impl Into<String>, existing_tags: Vec<String>) -> Self {
        Self {
            text: text.into(),
            existing_tags,
        }
    }
}
