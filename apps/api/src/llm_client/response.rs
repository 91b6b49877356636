//! Response parser: recovers a JSON value from raw model text.
//!
//! Decoding is all-or-nothing. A failure never propagates as an error: the caller
//! gets an empty mapping plus the cleaned text so the operator can see what came back.

use serde::Serialize;
use serde_json::{Map, Value};

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Raw model output that could not be decoded as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedResponse {
    /// The cleaned text that failed to decode.
    pub raw: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub value: Value,
    pub malformed: Option<MalformedResponse>,
}

impl ParsedResponse {
    fn empty() -> Self {
        Self {
            value: Value::Object(Map::new()),
            malformed: None,
        }
    }
}

/// Parses model output that was instructed to be JSON.
///
/// - `None` or blank input yields an empty mapping with no diagnostic.
/// - A leading code fence (with or without a `json` tag) has every fence marker removed.
/// - Anything that still fails strict decoding yields an empty mapping and a `MalformedResponse`.
pub fn parse_json_response(raw: Option<&str>) -> ParsedResponse {
    let Some(raw) = raw else {
        return ParsedResponse::empty();
    };

    if raw.trim().is_empty() {
        return ParsedResponse::empty();
    }

    let cleaned = strip_json_fences(raw);

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => ParsedResponse {
            value,
            malformed: None,
        },
        Err(e) => ParsedResponse {
            malformed: Some(MalformedResponse {
                raw: cleaned,
                reason: e.to_string(),
            }),
            ..ParsedResponse::empty()
        },
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> String {
    let text = text.trim();
    if text.starts_with(FENCE) {
        text.replace(JSON_FENCE, "")
            .replace(FENCE, "")
            .trim()
            .to_string()
    } else {
        text.to_string()
    }
}
