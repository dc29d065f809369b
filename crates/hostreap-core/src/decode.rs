//! Payload decoding.

use crate::error::DecodeError;
use crate::types::LifecycleEvent;

/// Decode a message body into a `LifecycleEvent`.
///
/// The body must be a JSON object. Unknown keys are ignored.
pub fn decode_event(body: &str) -> Result<LifecycleEvent, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }

    serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))
}
