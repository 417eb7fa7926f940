//! Serialization of persisted parameters and return values.
//!
//! Values are encoded as self-describing JSON. Argument tuples become JSON
//! arrays, which keeps the log inspectable with ordinary SQLite tooling. The
//! engine treats the resulting bytes as opaque; only this module ever looks
//! inside them.

use duraflow_types::CodecError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encode a value to its persisted byte form.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode a value from its persisted byte form.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

/// The unit value in decoded form, handed back to a resumer.
///
/// Decodes JSON `null`, so it works for `()` and any `Option<T>`.
pub fn unit<T: DeserializeOwned>() -> Result<T, CodecError> {
    serde_json::from_value(serde_json::Value::Null)
        .map_err(|e| CodecError::Decode(e.to_string()))
}
