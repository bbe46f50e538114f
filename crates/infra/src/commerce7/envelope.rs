//! Response envelope parsing
//!
//! Commerce7 wraps each page in an object holding the record array under a
//! resource-specific key (`orders`, `clubMemberships`). The declared key is
//! preferred; otherwise the first array-valued field is used.

use cellarsync_domain::{CellarSyncError, Result};
use serde_json::Value;
use tracing::warn;

/// Pull the record array out of a page body.
///
/// # Errors
/// Returns `CellarSyncError::UpstreamShape` when the body is not an object
/// or carries no array-valued field.
pub fn extract_records(body: Value, declared_field: &str) -> Result<Vec<Value>> {
    let Value::Object(mut fields) = body else {
        return Err(CellarSyncError::UpstreamShape(format!(
            "expected an object envelope holding `{declared_field}`"
        )));
    };

    if let Some(Value::Array(records)) = fields.remove(declared_field) {
        return Ok(records);
    }

    let fallback = fields.iter().find(|(_, value)| value.is_array()).map(|(key, _)| key.clone());
    match fallback.and_then(|key| fields.remove(&key).map(|value| (key, value))) {
        Some((key, Value::Array(records))) => {
            warn!(
                declared = declared_field,
                used = %key,
                "declared record field missing, using first array field"
            );
            Ok(records)
        }
        _ => Err(CellarSyncError::UpstreamShape(format!(
            "response has no `{declared_field}` array or any other array field"
        ))),
    }
}
