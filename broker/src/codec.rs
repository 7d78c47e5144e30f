//! The job codec (spec §4.2).
//!
//! Payloads and results travel the broker as `serde_json::Value` — a
//! self-describing, language-neutral structure of objects, arrays, numbers,
//! booleans, strings and nulls. Kind-specific request and result types
//! decode out of that `Value` with `#[serde(deny_unknown_fields)]`, so a
//! payload carrying a field unknown to its schema is rejected at decode
//! time (spec §8 invariant I9) rather than silently ignored.

use commons::{ErrorKind, JobError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a typed value into the self-describing wire structure.
pub fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value, JobError> {
    serde_json::to_value(value)
        .map_err(|e| JobError::new(ErrorKind::Validation, format!("failed to encode payload: {}", e)))
}

/// Decode the wire structure into a typed value, rejecting unknown fields.
///
/// Callers that need this to surface as a worker-side `decode` error
/// (rather than a gateway-side `validation` error) should remap the kind;
/// see [`decode_job`].
pub fn decode<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, JobError> {
    serde_json::from_value(value.clone())
        .map_err(|e| JobError::new(ErrorKind::Validation, format!("failed to decode payload: {}", e)))
}

/// Decode a popped job's payload, with a worker-appropriate error kind.
///
/// Spec §4.3: "On decode failure: publish `failed` with error kind
/// `decode`, do not retry."
pub fn decode_job<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, JobError> {
    serde_json::from_value(value.clone())
        .map_err(|e| JobError::new(ErrorKind::Decode, format!("failed to decode job payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Sample {
        a: String,
        b: u32,
    }

    #[test]
    fn round_trips_valid_payload() {
        let original = Sample {
            a: "hi".into(),
            b: 7,
        };
        let encoded = encode(&original).unwrap();
        let decoded: Sample = decode(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn rejects_unknown_fields() {
        let value = serde_json::json!({"a": "hi", "b": 7, "c": "surplus"});
        let result: Result<Sample, _> = decode_job(&value);
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decode);
    }

    #[test]
    fn rejects_missing_fields() {
        let value = serde_json::json!({"a": "hi"});
        let result: Result<Sample, _> = decode(&value);
        assert_eq!(result.unwrap_err().kind, ErrorKind::Validation);
    }
}
