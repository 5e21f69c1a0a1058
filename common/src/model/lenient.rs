//! Tolerant field decoders for survey payloads.
//!
//! Field apps post the same form values as JSON numbers on one screen and as
//! strings on another (`"19.07"` vs `19.07`, `"Yes"` vs `true`). These helpers
//! accept either spelling so a record decodes the same way regardless of which
//! client produced it. Empty strings and `null` decode to `None`.
//!
//! Use them together with `#[serde(default)]` so that absent fields also
//! decode to `None`.

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Text field that may arrive as a string, number or boolean.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(non_empty(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected text, found {}",
            kind(&other)
        ))),
    }
}

/// Decimal field (coordinates) given as a number or a numeric string.
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("number out of range")),
        Some(Value::String(s)) => match non_empty(s) {
            None => Ok(None),
            Some(s) => s
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("'{}' is not a number", s))),
        },
        Some(other) => Err(D::Error::custom(format!(
            "expected a number, found {}",
            kind(&other)
        ))),
    }
}

/// Non-negative count given as a number or a numeric string.
pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("'{}' is not a valid count", n))),
        Some(Value::String(s)) => match non_empty(s) {
            None => Ok(None),
            Some(s) => s
                .parse::<u32>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("'{}' is not a valid count", s))),
        },
        Some(other) => Err(D::Error::custom(format!(
            "expected a count, found {}",
            kind(&other)
        ))),
    }
}

/// Flag given as a boolean or as `yes`/`no`/`true`/`false` (any case).
pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "yes" | "true" | "y" | "1" => Ok(Some(true)),
            "no" | "false" | "n" | "0" => Ok(Some(false)),
            _ => Err(D::Error::custom(format!("'{}' is not a yes/no value", s))),
        },
        Some(Value::Number(n)) => match n.as_u64() {
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            _ => Err(D::Error::custom(format!("'{}' is not a yes/no value", n))),
        },
        Some(other) => Err(D::Error::custom(format!(
            "expected a yes/no value, found {}",
            kind(&other)
        ))),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s) }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
