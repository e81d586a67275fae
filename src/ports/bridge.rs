//! Local intake boundary: the producer of measurement data on each side hands
//! over one request per run and receives the derived key (or a failure).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::domain::{
    Beta, FinalKey, MdrDimension, ReconciledKey, SecretKeyRatio, SignalToNoiseRatio,
    SymbolSequence,
};

/// Alice's local request.
///
/// `privacy_amplification` must agree with whether Bob's request carries a
/// `secret_key_ratio`; otherwise the party expecting amplification fails.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AliceRequest {
    pub alice_symbols: SymbolSequence,
    pub mdr_dimension: MdrDimension,
    #[serde(default = "enabled")]
    pub privacy_amplification: bool,
}

fn enabled() -> bool {
    true
}

/// Bob's local request. Without `secret_key_ratio` only reconciliation runs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BobRequest {
    pub bob_symbols: SymbolSequence,
    pub beta: Beta,
    pub signal_to_noise_ratio: SignalToNoiseRatio,
    pub mdr_dimension: MdrDimension,
    #[serde(default)]
    pub secret_key_ratio: Option<SecretKeyRatio>,
}

/// Result handed back to the local producer.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyReply {
    Final(FinalKey),
    /// Privacy amplification was not requested for this run.
    Reconciled(ReconciledKey),
    Failure(String),
}

impl KeyReply {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, KeyReply::Failure(_))
    }
}

#[derive(Serialize)]
struct KeyReplyWire<'a> {
    key: Option<&'a [u8]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for KeyReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            KeyReply::Final(k) => KeyReplyWire {
                key: Some(k.bits()),
                error: None,
            },
            KeyReply::Reconciled(k) => KeyReplyWire {
                key: Some(k.bits()),
                error: None,
            },
            KeyReply::Failure(reason) => KeyReplyWire {
                key: None,
                error: Some(reason),
            },
        };
        wire.serialize(serializer)
    }
}

#[derive(Debug, Error)]
pub enum RequestSourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed request: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no pending request to reply to")]
    NoPendingRequest,
}

/// Supplies local requests one at a time and accepts the matching reply.
pub trait RequestSource {
    type Request: DeserializeOwned;

    /// Block for the next request. `Ok(None)` means the source is exhausted.
    ///
    /// # Errors
    /// [`RequestSourceError`] on intake failure or an undecodable request.
    fn next_request(&mut self) -> Result<Option<Self::Request>, RequestSourceError>;

    /// Answer the request last taken by `next_request`, including one that
    /// failed to decode.
    ///
    /// # Errors
    /// [`RequestSourceError::NoPendingRequest`] if nothing is outstanding.
    fn reply(&mut self, reply: &KeyReply) -> Result<(), RequestSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bob_request_parses_with_optional_ratio() {
        let r: BobRequest = serde_json::from_str(
            r#"{"bob_symbols":[0.5,-1.0],"beta":0.95,"signal_to_noise_ratio":0.4,"mdr_dimension":8}"#,
        )
        .unwrap();
        assert_eq!(r.bob_symbols.len(), 2);
        assert!(r.secret_key_ratio.is_none());
    }

    #[test]
    fn alice_request_defaults_to_amplification() {
        let r: AliceRequest =
            serde_json::from_str(r#"{"alice_symbols":[1.0,-0.5],"mdr_dimension":1}"#).unwrap();
        assert!(r.privacy_amplification);
    }

    #[test]
    fn alice_request_rejects_unsupported_dimension() {
        let r = serde_json::from_str::<AliceRequest>(r#"{"alice_symbols":[1.0],"mdr_dimension":3}"#);
        assert!(r.is_err());
    }

    #[test]
    fn key_reply_wire_shape() {
        let ok = KeyReply::Final(FinalKey::new(vec![1, 0, 1]).unwrap());
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"key":[1,0,1]}"#);
        let failed = KeyReply::Failure("peer rejected".into());
        assert_eq!(
            serde_json::to_string(&failed).unwrap(),
            r#"{"key":null,"error":"peer rejected"}"#
        );
    }
}
