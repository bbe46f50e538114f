//! Lenient serde adapters for loosely structured upstream payloads.
//!
//! Commerce7 payloads occasionally carry numbers as strings, nulls where a
//! value is expected, or omit fields entirely. These adapters never fail:
//! anything unusable collapses to an empty/zero value so that order
//! normalization stays total.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// String or number → `Some(String)`; null, missing or other shapes → `None`.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(string_from_value))
}

/// Like [`opt_string`] but collapses to an empty string.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string(deserializer)?.unwrap_or_default())
}

/// Monetary amount in minor units. Accepts integers, floats and numeric
/// strings; anything else is zero.
pub fn minor_units<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value).map_or(0, |n| n.round() as i64))
}

/// Line-item quantity. Negative or unusable values count as zero.
pub fn quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .map_or(0, |n| if n.is_sign_negative() { 0 } else { n.round() as u32 }))
}

/// Array whose malformed elements are replaced with `T::default()`; a
/// non-array value yields an empty vector.
pub fn seq_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => {
            items.into_iter().map(|item| serde_json::from_value(item).unwrap_or_default()).collect()
        }
        _ => Vec::new(),
    })
}

/// Nested object that falls back to `None` when it does not parse.
pub fn opt_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(obj @ Value::Object(_)) => serde_json::from_value(obj).ok(),
        _ => None,
    })
}

fn string_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}
