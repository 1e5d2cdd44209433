//! Parse model output into candidate tags
//!
//! Backends answer in different shapes: a forced function call, a JSON body,
//! or plain text. Each shape has its own strategy; they are tried in a fixed
//! order and the first one that recognizes its shape wins.

use crate::error::TaggerError;
use serde_json::Value;
use taxotag_domain::{marker::has_marker, TAG_COUNT};
use taxotag_llm::RawResponse;
use tracing::{debug, warn};

/// A pure extraction attempt over one response shape
pub type Strategy = fn(&RawResponse) -> Option<Vec<String>>;

/// Strategies in priority order, with names for logging
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("callable arguments", from_call_arguments),
    ("tags field", from_tags_field),
    ("text body", from_text_body),
];

/// Run the strategies in order and return the first hit
pub fn parse_response(response: &RawResponse) -> Result<Vec<String>, TaggerError> {
    for (name, strategy) in STRATEGIES {
        if let Some(tags) = strategy(response) {
            debug!("Parsed {} candidate tags from {}", tags.len(), name);
            return Ok(tags);
        }
    }

    warn!("No parser strategy recognized the model response");
    Err(TaggerError::Parse("Invalid response format".to_string()))
}

/// `tags` from a function call, tool call or Anthropic `tool_use` block
pub fn from_call_arguments(response: &RawResponse) -> Option<Vec<String>> {
    let body = response.as_structured()?;

    if let Some(tags) = body
        .get("function_call")
        .and_then(|call| call.get("arguments"))
        .and_then(tags_in_arguments)
    {
        return Some(tags);
    }

    if let Some(tags) = body
        .get("tool_calls")
        .and_then(Value::as_array)
        .and_then(|calls| {
            calls
                .iter()
                .filter_map(|call| call.get("function")?.get("arguments"))
                .find_map(tags_in_arguments)
        })
    {
        return Some(tags);
    }

    body.get("content")
        .and_then(Value::as_array)?
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("tool_use"))
        .filter_map(|block| block.get("input"))
        .find_map(tags_in_arguments)
}

/// `tags` at the top level of a structured body
pub fn from_tags_field(response: &RawResponse) -> Option<Vec<String>> {
    tags_of(response.as_structured()?)
}

/// Tags from whatever text the response carries
pub fn from_text_body(response: &RawResponse) -> Option<Vec<String>> {
    let text = match response {
        RawResponse::Text(text) => text.clone(),
        RawResponse::Structured(value) => text_of(value)?,
    };
    Some(tags_from_text(&text))
}

/// Arguments are either a JSON object or a string holding one
fn tags_in_arguments(arguments: &Value) -> Option<Vec<String>> {
    match arguments {
        Value::String(encoded) => tags_of(&serde_json::from_str(encoded).ok()?),
        other => tags_of(other),
    }
}

fn tags_of(value: &Value) -> Option<Vec<String>> {
    let tags = value.get("tags")?.as_array()?;
    Some(strings_of(tags))
}

fn strings_of(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Text held by a structured body: a JSON string, a `content` string, or
/// Anthropic `text` blocks
fn text_of(value: &Value) -> Option<String> {
    if let Some(text) = value.as_str() {
        return Some(text.to_string());
    }

    let content = value.get("content")?;
    if let Some(text) = content.as_str() {
        return Some(text.to_string());
    }

    let blocks: Vec<&str> = content
        .as_array()?
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n"))
    }
}

/// JSON tags if the text holds them, otherwise the first marked tokens
///
/// Always yields a list, possibly empty; the validator reports the shortfall.
fn tags_from_text(text: &str) -> Vec<String> {
    let body = strip_code_fence(text);

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let decoded = match &json {
            Value::Array(items) => Some(strings_of(items)),
            other => tags_of(other),
        };
        if let Some(tags) = decoded {
            return tags;
        }
    }

    body
        .split(['\n', ','])
        .map(str::trim)
        .filter(|token| has_marker(token))
        .take(TAG_COUNT)
        .map(str::to_string)
        .collect()
}

/// Drop a surrounding markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    // Skip the opening line (``` or ```json) and the closing fence
    let inner = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => return trimmed.trim_matches('`').trim(),
    };
    inner.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_openai_tool_call() {
        let response = RawResponse::from(json!({
            "role": "assistant",
            "tool_calls": [{
                "type": "function",
                "function": {
                    "name": "generate_tags",
                    "arguments": "{\"tags\": [\"#a\", \"#b\"]}"
                }
            }]
        }));
        assert_eq!(parse_response(&response).unwrap(), tags(&["#a", "#b"]));
    }

    #[test]
    fn test_legacy_function_call() {
        let response = RawResponse::from(json!({
            "function_call": { "name": "generate_tags", "arguments": "{\"tags\": [\"#x\"]}" }
        }));
        assert_eq!(from_call_arguments(&response), Some(tags(&["#x"])));
    }

    #[test]
    fn test_anthropic_tool_use() {
        let response = RawResponse::from(json!({
            "content": [
                { "type": "text", "text": "Here you go" },
                { "type": "tool_use", "name": "generate_tags", "input": { "tags": ["#a"] } }
            ]
        }));
        assert_eq!(parse_response(&response).unwrap(), tags(&["#a"]));
    }

    #[test]
    fn test_direct_tags_field() {
        let response = RawResponse::from(json!({ "tags": ["#a", "#b", 3] }));
        assert_eq!(from_call_arguments(&response), None);
        assert_eq!(parse_response(&response).unwrap(), tags(&["#a", "#b"]));
    }

    #[test]
    fn test_json_text_in_fence() {
        let response = RawResponse::from("```json\n{\"tags\": [\"#a\", \"#b\"]}\n```");
        assert_eq!(parse_response(&response).unwrap(), tags(&["#a", "#b"]));
    }

    #[test]
    fn test_bare_json_array_text() {
        let response = RawResponse::from("[\"#a\", \"#b\"]");
        assert_eq!(parse_response(&response).unwrap(), tags(&["#a", "#b"]));
    }

    #[test]
    fn test_delimited_text() {
        let response = RawResponse::from("#b, #c\n#d,#e,#f");
        assert_eq!(
            parse_response(&response).unwrap(),
            tags(&["#b", "#c", "#d", "#e", "#f"])
        );
    }

    #[test]
    fn test_delimited_text_keeps_first_five_marked_tokens() {
        let response = RawResponse::from("Tags:\n#a, b, #c, #d\n#e, #f, #g");
        assert_eq!(
            parse_response(&response).unwrap(),
            tags(&["#a", "#c", "#d", "#e", "#f"])
        );
    }

    #[test]
    fn test_message_content_string() {
        let response = RawResponse::from(json!({ "role": "assistant", "content": "#a,#b" }));
        assert_eq!(parse_response(&response).unwrap(), tags(&["#a", "#b"]));
    }

    #[test]
    fn test_anthropic_text_blocks() {
        let response = RawResponse::from(json!({
            "content": [{ "type": "text", "text": "{\"tags\": [\"#a\"]}" }]
        }));
        assert_eq!(parse_response(&response).unwrap(), tags(&["#a"]));
    }

    #[test]
    fn test_json_string_value() {
        let response = RawResponse::from(json!("#a\n#b"));
        assert_eq!(parse_response(&response).unwrap(), tags(&["#a", "#b"]));
    }

    #[test]
    fn test_unrecognized_shapes() {
        for response in [
            RawResponse::from(json!({ "id": "x", "choices": [] })),
            RawResponse::from(json!(42)),
        ] {
            match parse_response(&response) {
                Err(TaggerError::Parse(message)) => {
                    assert_eq!(message, "Invalid response format")
                }
                other => panic!("expected parse error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_text_without_markers_yields_empty_list() {
        let response = RawResponse::from("I cannot help with that.");
        assert!(parse_response(&response).unwrap().is_empty());

        let response = RawResponse::from(json!({ "content": "No tags apply." }));
        assert!(parse_response(&response).unwrap().is_empty());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```json\n{}\n```  "), "{}");
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }
}
