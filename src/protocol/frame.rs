//! Byte form of an [`Envelope`]: `u16` big-endian code, then exactly one CBOR
//! item (`null` when there is no payload).
//!
//! Length delimiting is the transport's job; see the stream channel adapter.

use crate::core::cbor::{CodecError, Value, from_cbor, to_cbor};
use crate::protocol::codes::{ControlCode, UnknownCode};
use crate::protocol::message::Envelope;

const CODE_LEN: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame too short: {0} bytes")]
    Truncated(usize),
    #[error(transparent)]
    UnknownCode(#[from] UnknownCode),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Encode an envelope to bytes.
///
/// # Errors
/// Returns [`FrameError::Codec`] if the payload cannot be serialized.
pub fn encode_envelope(env: &Envelope) -> Result<Vec<u8>, FrameError> {
    let body = to_cbor(&env.payload)?;
    let mut out = Vec::with_capacity(CODE_LEN + body.len());
    out.extend_from_slice(&env.code.as_u16().to_be_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode bytes produced by [`encode_envelope`].
///
/// # Errors
/// * [`FrameError::Truncated`] if fewer than two bytes are present.
/// * [`FrameError::UnknownCode`] for a code outside the closed set.
/// * [`FrameError::Codec`] for invalid, trailing or non-canonical CBOR.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, FrameError> {
    let Some((head, body)) = bytes.split_first_chunk::<CODE_LEN>() else {
        return Err(FrameError::Truncated(bytes.len()));
    };
    let code = ControlCode::try_from(u16::from_be_bytes(*head))?;
    let payload: Option<Value> = from_cbor(body)?;
    Ok(Envelope { code, payload })
}
