//! Taxotag Domain Layer
//!
//! Core vocabulary and configuration types for closed-vocabulary document
//! tagging. Like every domain crate in this workspace it has no external
//! dependencies; the LLM and pipeline crates build on these types.
//!
//! ## Key Concepts
//!
//! - **Vocabulary**: the closed, user-defined set of permissible tags
//! - **Marker**: the leading `#` every tag carries
//! - **Document Input**: text plus the tags a document already has
//! - **Backend Descriptor**: provider, model, token limit, endpoint, credential
//! - **Tag Mode**: output flags such as lowercase mode

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod document;
pub mod marker;
pub mod provider;
pub mod vocabulary;

// Re-exports for convenience
pub use backend::{BackendDescriptor, TagMode};
pub use document::DocumentInput;
pub use marker::MARKER;
pub use provider::Provider;
pub use vocabulary::Vocabulary;

/// Number of tags every successful run produces
pub const TAG_COUNT: usize = 5;
