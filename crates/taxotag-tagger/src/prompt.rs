//! Prompt construction for closed-vocabulary tagging

use crate::error::ConfigurationError;
use serde_json::json;
use taxotag_domain::{Vocabulary, TAG_COUNT};
use taxotag_llm::{ChatMessage, ChatRequest, ToolSchema};

/// Name of the callable used for structured invocation
pub const TAG_TOOL_NAME: &str = "generate_tags";

/// Heading placed between the instruction and the vocabulary
const VOCABULARY_HEADING: &str = "ALLOWED TAGS:";

/// Average characters per token used for the length precheck
const CHARS_PER_TOKEN: usize = 4;

/// Instruction used when no custom system prompt is configured
pub const DEFAULT_INSTRUCTION: &str = "\
## ROLE
You classify documents using a fixed list of tags. \
Your task is to read one document and pick the tags from that list that describe it best.

## INPUT
You receive:
1. The list of allowed tags, which are the only tags you may use
2. One document between triple backticks

## ANALYSIS
1. Read the whole document
2. Work out:
   - Its main subjects
   - Its audience
   - Its purpose
   - Its key ideas

## RULES
- Choose exactly 5 tags
- Use only tags from the allowed list, spelled exactly as listed
- Every tag starts with #
- Pick tags that relate directly to the content
- Do not pick two tags that mean the same thing

## OUTPUT
Answer with the tags only, as JSON in this shape:
{\"tags\": [\"#tag1\", \"#tag2\", \"#tag3\", \"#tag4\", \"#tag5\"]}
No explanations, no other text, no changes to tag names.

## VERIFICATION
Before answering, check that:
1. There are exactly 5 tags
2. Each tag is in the allowed list
3. Each tag starts with #
4. Each tag is relevant to the document";

/// Which instruction heads the system message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SystemInstruction {
    /// Built-in instruction
    #[default]
    Default,
    /// User-supplied instruction
    Custom(String),
}

impl SystemInstruction {
    /// Instruction text
    pub fn text(&self) -> &str {
        match self {
            SystemInstruction::Default => DEFAULT_INSTRUCTION,
            SystemInstruction::Custom(text) => text,
        }
    }
}

/// Builds the two-message request sent to the model
///
/// The vocabulary is always appended to the instruction, custom or not.
pub struct PromptBuilder<'a> {
    instruction: &'a SystemInstruction,
    vocabulary: &'a Vocabulary,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(instruction: &'a SystemInstruction, vocabulary: &'a Vocabulary) -> Self {
        Self {
            instruction,
            vocabulary,
        }
    }

    /// System message: instruction followed by the vocabulary, one tag per line
    pub fn system_message(&self) -> String {
        format!(
            "{}\n\n{}\n{}",
            self.instruction.text().trim_end(),
            VOCABULARY_HEADING,
            self.vocabulary.render()
        )
    }

    /// User message: the document between triple backticks
    pub fn user_message(document_text: &str) -> String {
        format!("Document to analyze:\n```\n{}\n```", document_text)
    }

    /// Build a free-form request
    pub fn build(&self, document_text: &str) -> Result<ChatRequest, ConfigurationError> {
        if self.vocabulary.is_empty() {
            return Err(ConfigurationError::EmptyVocabulary);
        }

        Ok(ChatRequest::new(vec![
            ChatMessage::system(self.system_message()),
            ChatMessage::user(Self::user_message(document_text)),
        ]))
    }
}

/// Schema of the `generate_tags` callable
///
/// The array bounds are looser than the result invariant; the validator
/// still demands exactly five.
pub fn tag_tool_schema() -> ToolSchema {
    ToolSchema {
        name: TAG_TOOL_NAME.to_string(),
        description: format!(
            "Return exactly {} tags from the allowed list that best describe the document",
            TAG_COUNT
        ),
        parameters: json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "description": "Tags from the allowed list, each starting with #",
                    "items": {
                        "type": "string",
                        "pattern": "^#\\S+$"
                    },
                    "minItems": 1,
                    "maxItems": 10
                }
            },
            "required": ["tags"]
        }),
    }
}

/// Rough token count of a request (characters / 4)
pub fn estimate_tokens(request: &ChatRequest) -> usize {
    request.char_count() / CHARS_PER_TOKEN
}
