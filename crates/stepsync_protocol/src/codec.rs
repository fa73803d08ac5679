//! JSON and CBOR encodings shared by every wire type.

use crate::error::{ProtocolError, ProtocolResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a value to a JSON value.
pub fn to_json<T: Serialize>(value: &T) -> ProtocolResult<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

/// Decodes a value from a JSON value.
pub fn from_json<T: DeserializeOwned>(value: serde_json::Value) -> ProtocolResult<T> {
    Ok(serde_json::from_value(value)?)
}

/// Encodes a value to a JSON string.
pub fn to_json_string<T: Serialize>(value: &T) -> ProtocolResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decodes a value from a JSON string.
pub fn from_json_str<T: DeserializeOwned>(text: &str) -> ProtocolResult<T> {
    Ok(serde_json::from_str(text)?)
}

/// Encodes a value to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> ProtocolResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).map_err(|e| ProtocolError::cbor(e.to_string()))?;
    Ok(bytes)
}

/// Decodes a value from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> ProtocolResult<T> {
    ciborium::from_reader(bytes).map_err(|e| ProtocolError::cbor(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbor_rejects_truncated_input() {
        let bytes = to_cbor(&vec![1u64, 2, 3]).unwrap();
        let result: ProtocolResult<Vec<u64>> = from_cbor(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(ProtocolError::Cbor { .. })));
    }

    #[test]
    fn json_string_roundtrip() {
        let text = to_json_string(&("a", 7u8)).unwrap();
        assert_eq!(text, "[\"a\",7]");
        let back: (String, u8) = from_json_str(&text).unwrap();
        assert_eq!(back, ("a".to_string(), 7));
    }
}
