//! CBOR codec helpers for control payloads.
//!
//! This module is *infrastructure*, not protocol-specific:
//! - `to_cbor` serializes any `T: Serialize` using **ciborium** (deterministic by default).
//! - `from_cbor` deserializes, always strict (no trailing bytes) and
//!   always rejects non-canonical encodings.
//! - `to_value` / `from_value` move between typed payloads and the untyped
//!   `ciborium::Value` carried by an envelope.
//!
//! `from_cbor` expects exactly the CBOR payload (no framing). The stream
//! channel strips the length and code preamble before calling it.

use serde::{Serialize, de::DeserializeOwned};
use std::io::Cursor;

pub use ciborium::Value;

/// Errors produced by the generic codec.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// Error produced during serialization.
    #[error("CBOR serialize error: {0}")]
    Ser(#[from] ciborium::ser::Error<std::io::Error>),

    /// Error produced during deserialization.
    #[error("CBOR deserialize error: {0}")]
    De(#[from] ciborium::de::Error<std::io::Error>),

    /// Conversion between a typed value and `ciborium::Value` failed.
    #[error("CBOR value conversion error: {0}")]
    Value(String),

    /// The input bytes were well-formed CBOR but not in deterministic form.
    #[error("CBOR input is not in canonical/deterministic form")]
    NonCanonical,
}

/// Serialize any `T: Serialize` to CBOR bytes (deterministic under ciborium).
///
/// # Errors
///
/// Returns a [`CodecError::Ser`] if serialization fails.
pub fn to_cbor<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(256);
    ciborium::ser::into_writer(v, &mut buf)?;
    Ok(buf)
}

/// Deserialize any `T: DeserializeOwned + Serialize` from CBOR bytes.
///
/// Strict decoding:
/// * Rejects trailing garbage after a valid item.
/// * Rejects non-canonical encodings by re-encoding deterministically and
///   requiring an exact byte-for-byte match to the input.
///
/// # Errors
///
/// * [`CodecError::De`] if deserialization fails or there are trailing bytes.
/// * [`CodecError::NonCanonical`] if the input is well‑formed but not canonical.
pub fn from_cbor<T: DeserializeOwned + Serialize>(b: &[u8]) -> Result<T, CodecError> {
    let mut cur = Cursor::new(b);
    let value: T = ciborium::de::from_reader(&mut cur)?;
    let pos = usize::try_from(cur.position()).map_err(|_| invalid_data("cursor position overflow"))?;
    if pos != b.len() {
        return Err(invalid_data("trailing bytes after CBOR value"));
    }
    let canon = to_cbor(&value)?;
    if canon != b {
        return Err(CodecError::NonCanonical);
    }
    Ok(value)
}

/// Convert a typed value into an untyped CBOR [`Value`].
///
/// # Errors
/// Returns [`CodecError::Value`] if `v` cannot be represented.
pub fn to_value<T: Serialize>(v: &T) -> Result<Value, CodecError> {
    Value::serialized(v).map_err(|e| CodecError::Value(e.to_string()))
}

/// Convert an untyped CBOR [`Value`] into a typed value.
///
/// # Errors
/// Returns [`CodecError::Value`] if the shape of `v` does not match `T`.
pub fn from_value<T: DeserializeOwned>(v: &Value) -> Result<T, CodecError> {
    v.deserialized().map_err(|e| CodecError::Value(e.to_string()))
}

pub(crate) fn invalid_data(msg: &str) -> CodecError {
    CodecError::De(ciborium::de::Error::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        msg.to_string(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Demo {
        a: u8,
        b: Vec<f64>,
    }

    #[test]
    fn strict_rejects_trailing() {
        let v = Demo { a: 3, b: vec![0.5] };
        let mut bytes = to_cbor(&v).unwrap();
        let mut tail = Vec::new();
        ciborium::ser::into_writer(&0u8, &mut tail).unwrap();
        bytes.extend_from_slice(&tail);
        let err = from_cbor::<Demo>(&bytes).unwrap_err();
        assert!(format!("{err}").contains("trailing"));
    }

    #[test]
    fn deterministic_and_strict_decode_ok() {
        let v = Demo { a: 5, b: vec![1.0, -2.25] };
        let bytes1 = to_cbor(&v).unwrap();
        let bytes2 = to_cbor(&v).unwrap();
        assert_eq!(bytes1, bytes2);
        let out: Demo = from_cbor(&bytes1).unwrap();
        assert_eq!(out, v);
    }

    #[test]
    fn value_conversion_preserves_fields() {
        let v = Demo { a: 7, b: vec![3.5] };
        let value = to_value(&v).unwrap();
        assert!(value.is_map());
        let back: Demo = from_value(&value).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn value_shape_mismatch_is_error() {
        let value = to_value(&"not a struct").unwrap();
        assert!(matches!(from_value::<Demo>(&value), Err(CodecError::Value(_))));
    }
}
