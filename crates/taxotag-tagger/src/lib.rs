//! Taxotag Tagger
//!
//! Assigns exactly five tags from a closed vocabulary to a document by asking
//! a language model and then strictly checking what it says.
//!
//! # Architecture
//!
//! ```text
//! Vocabulary + document → PromptBuilder → ChatModel → parser → TagValidator → 5 tags
//!                                                 ↘ any failure → classify → TaggingFailure
//! ```
//!
//! # Key Features
//!
//! - **Closed vocabulary**: the model may only pick from the configured tags
//! - **Any backend shape**: forced tool calls, JSON bodies, or plain text
//! - **Strict result**: five distinct, marker-prefixed vocabulary members that
//!   the document does not already carry; never padded
//! - **Actionable errors**: one classified message per failure
//! - **Batch tagging**: many documents concurrently, results in input order
//!
//! # Example Usage
//!
//! ```no_run
//! use taxotag_tagger::{Tagger, TaggerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TaggerConfig::from_file("taxotag.toml")?;
//! let tagger = Tagger::new(config.resolve()?)?;
//!
//! let tags = tagger
//!     .generate_tags("Notes on async Rust and tokio", &["#rust".to_string()])
//!     .await?;
//! println!("{}", tags.join(" "));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod classifier;
mod config;
mod error;
mod parser;
mod prompt;
mod tagger;
mod validator;


pub use classifier::{classify, FailureKind, TaggingFailure};
pub use config::{TaggerConfig, TaggerSettings};
pub use error::{ConfigurationError, ErrorCategory, Stage, TaggerError, ValidationError};
pub use parser::{parse_response, Strategy, STRATEGIES};
pub use prompt::{
    estimate_tokens, tag_tool_schema, PromptBuilder, SystemInstruction, DEFAULT_INSTRUCTION,
    TAG_TOOL_NAME,
};
pub use tagger::Tagger;
pub use validator::TagValidator;
