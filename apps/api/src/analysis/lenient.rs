//! Lenient field decoders for model-produced JSON.
//!
//! The model is asked for a fixed shape but nothing enforces it. Every profile
//! field goes through one of these so a missing, null or wrongly-typed value decodes
//! to an empty default instead of failing the whole profile.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Decodes a whole profile. Anything that is not a JSON object becomes the default profile.
pub fn decode_profile<T: DeserializeOwned + Default>(value: &Value) -> T {
    if !value.is_object() {
        return T::default();
    }
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// A list of strings. Scalars inside the list are stringified, other items dropped.
/// A lone non-blank string becomes a one-item list.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(scalar_text)
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

/// A single text value. Numbers and booleans are stringified, lists of scalars joined
/// with `"; "`, objects rendered as compact JSON.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => value.to_string(),
        other => scalar_text(other).unwrap_or_default(),
    })
}

/// A list of records. Items that do not decode as `T` are dropped.
pub fn records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
