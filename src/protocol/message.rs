//! Typed control messages and their untyped envelope form.
//!
//! A channel moves [`Envelope`]s: a [`ControlCode`] plus an optional CBOR map.
//! [`ControlMessage`] is the closed tagged-variant view, one variant per code,
//! each carrying exactly the fields that code requires. Conversion from an
//! envelope is where a missing or malformed field is detected, so protocol
//! code never performs ad-hoc key lookups.

use serde::de::DeserializeOwned;

use crate::core::cbor::{CodecError, Value, from_value, to_value};
use crate::domain::amplification::AmplificationRequest;
use crate::domain::reconciliation::{
    ErrorReport, ReconciliationDiscardFlags, ReconciliationInit, ReconciliationVerification,
};
use crate::protocol::codes::ControlCode;

/// Wire-level message: code plus optional structured payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub code: ControlCode,
    pub payload: Option<Value>,
}

impl Envelope {
    /// Envelope without payload.
    #[must_use]
    pub fn bare(code: ControlCode) -> Self {
        Self { code, payload: None }
    }

    #[must_use]
    pub fn with_payload(code: ControlCode, payload: Value) -> Self {
        Self {
            code,
            payload: Some(payload),
        }
    }
}

/// Errors converting between [`Envelope`] and [`ControlMessage`].
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The code requires a payload but none was attached.
    #[error("{code}: payload missing")]
    MissingPayload { code: ControlCode },
    /// Payload present but not a CBOR map.
    #[error("{code}: payload is not a map")]
    NotAMap { code: ControlCode },
    /// One or more required fields are absent.
    #[error("{code}: missing field(s) {}", fields.join(", "))]
    MissingFields {
        code: ControlCode,
        fields: Vec<&'static str>,
    },
    /// A field is present but does not have the expected shape or range.
    #[error("{code}: field {field} malformed: {reason}")]
    MalformedField {
        code: ControlCode,
        field: &'static str,
        reason: String,
    },
    /// Encoding a payload into CBOR failed.
    #[error("payload encoding failed: {0}")]
    Codec(#[from] CodecError),
}

impl MessageError {
    /// Text for the `error_message` of an `INVALID_CONTENT` reply.
    #[must_use]
    pub fn invalid_content_report(&self) -> ErrorReport {
        let text = match self {
            MessageError::MissingFields { fields, .. } => {
                format!("{} parameter was not present in the content.", fields.join(" or "))
            }
            MessageError::MissingPayload { code } | MessageError::NotAMap { code } => {
                format!("{code} requires a payload map.")
            }
            MessageError::MalformedField { field, reason, .. } => {
                format!("{field} parameter is malformed: {reason}")
            }
            MessageError::Codec(e) => format!("payload could not be decoded: {e}"),
        };
        ErrorReport::new(text)
    }
}

/// Closed set of control messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    InvalidContent(Option<ErrorReport>),
    UnexpectedCommand,
    ReconciliationInit(ReconciliationInit),
    ReconciliationVerification(ReconciliationVerification),
    ReconciliationDiscardFlags(ReconciliationDiscardFlags),
    ReconciliationFinished,
    ReconciliationError(Option<ErrorReport>),
    AmplificationRequest(AmplificationRequest),
    AmplificationSuccess,
    AmplificationError(Option<ErrorReport>),
}

impl ControlMessage {
    #[must_use]
    pub fn code(&self) -> ControlCode {
        match self {
            ControlMessage::InvalidContent(_) => ControlCode::InvalidContent,
            ControlMessage::UnexpectedCommand => ControlCode::UnexpectedCommand,
            ControlMessage::ReconciliationInit(_) => ControlCode::ReconciliationInitialization,
            ControlMessage::ReconciliationVerification(_) => ControlCode::ReconciliationVerification,
            ControlMessage::ReconciliationDiscardFlags(_) => ControlCode::ReconciliationDiscardFlags,
            ControlMessage::ReconciliationFinished => ControlCode::ReconciliationFinished,
            ControlMessage::ReconciliationError(_) => ControlCode::ReconciliationError,
            ControlMessage::AmplificationRequest(_) => ControlCode::AmplificationRequest,
            ControlMessage::AmplificationSuccess => ControlCode::AmplificationSuccess,
            ControlMessage::AmplificationError(_) => ControlCode::AmplificationError,
        }
    }

    /// Encode into an envelope.
    ///
    /// # Errors
    /// Returns [`MessageError::Codec`] if a payload cannot be represented as CBOR.
    pub fn to_envelope(&self) -> Result<Envelope, MessageError> {
        let code = self.code();
        let payload = match self {
            ControlMessage::UnexpectedCommand
            | ControlMessage::ReconciliationFinished
            | ControlMessage::AmplificationSuccess => None,
            ControlMessage::InvalidContent(r)
            | ControlMessage::ReconciliationError(r)
            | ControlMessage::AmplificationError(r) => r.as_ref().map(to_value).transpose()?,
            ControlMessage::ReconciliationInit(p) => Some(to_value(p)?),
            ControlMessage::ReconciliationVerification(p) => Some(to_value(p)?),
            ControlMessage::ReconciliationDiscardFlags(p) => Some(to_value(p)?),
            ControlMessage::AmplificationRequest(p) => Some(to_value(p)?),
        };
        Ok(Envelope { code, payload })
    }
}

impl TryFrom<&Envelope> for ControlMessage {
    type Error = MessageError;

    fn try_from(env: &Envelope) -> Result<Self, Self::Error> {
        let code = env.code;
        Ok(match code {
            ControlCode::UnexpectedCommand => ControlMessage::UnexpectedCommand,
            ControlCode::ReconciliationFinished => ControlMessage::ReconciliationFinished,
            ControlCode::AmplificationSuccess => ControlMessage::AmplificationSuccess,
            ControlCode::InvalidContent => ControlMessage::InvalidContent(optional_report(env)),
            ControlCode::ReconciliationError => {
                ControlMessage::ReconciliationError(optional_report(env))
            }
            ControlCode::AmplificationError => ControlMessage::AmplificationError(optional_report(env)),
            ControlCode::ReconciliationInitialization => {
                let p = Fields::of(env)?;
                p.require(&ReconciliationInit::FIELDS)?;
                ControlMessage::ReconciliationInit(ReconciliationInit {
                    channel_message: p.field("channel_message")?,
                    syndrome: p.field("syndrome")?,
                    normalization_vector: p.field("normalization_vector")?,
                    signal_to_noise_ratio: p.field("signal_to_noise_ratio")?,
                })
            }
            ControlCode::ReconciliationVerification => {
                let p = Fields::of(env)?;
                p.require(&ReconciliationVerification::FIELDS)?;
                ControlMessage::ReconciliationVerification(ReconciliationVerification {
                    crc_alice: p.field("crc_alice")?,
                    discard_flags: p.field("discard_flags")?,
                })
            }
            ControlCode::ReconciliationDiscardFlags => {
                let p = Fields::of(env)?;
                p.require(&ReconciliationDiscardFlags::FIELDS)?;
                ControlMessage::ReconciliationDiscardFlags(ReconciliationDiscardFlags {
                    final_discard_flags: p.field("final_discard_flags")?,
                })
            }
            ControlCode::AmplificationRequest => {
                let p = Fields::of(env)?;
                p.require(&AmplificationRequest::FIELDS)?;
                ControlMessage::AmplificationRequest(AmplificationRequest {
                    seed: p.field("seed")?,
                    secret_key_ratio: p.field("secret_key_ratio")?,
                })
            }
        })
    }
}

impl TryFrom<Envelope> for ControlMessage {
    type Error = MessageError;
    fn try_from(env: Envelope) -> Result<Self, Self::Error> {
        ControlMessage::try_from(&env)
    }
}

/// Error outcomes tolerate a missing or odd `error_message`; the code alone
/// carries the meaning.
fn optional_report(env: &Envelope) -> Option<ErrorReport> {
    env.payload.as_ref().and_then(|v| from_value(v).ok())
}

/// Borrowed view over a payload map keyed by field name.
struct Fields<'a> {
    code: ControlCode,
    entries: &'a [(Value, Value)],
}

impl<'a> Fields<'a> {
    fn of(env: &'a Envelope) -> Result<Self, MessageError> {
        let code = env.code;
        match &env.payload {
            None => Err(MessageError::MissingPayload { code }),
            Some(Value::Map(entries)) => Ok(Self { code, entries }),
            Some(_) => Err(MessageError::NotAMap { code }),
        }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.entries.iter().find_map(|(k, v)| match k {
            Value::Text(t) if t == name => Some(v),
            _ => None,
        })
    }

    fn require(&self, names: &[&'static str]) -> Result<(), MessageError> {
        let missing: Vec<&'static str> = names
            .iter()
            .copied()
            .filter(|n| self.get(n).is_none())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MessageError::MissingFields {
                code: self.code,
                fields: missing,
            })
        }
    }

    fn field<T: DeserializeOwned>(&self, name: &'static str) -> Result<T, MessageError> {
        let v = self.get(name).ok_or(MessageError::MissingFields {
            code: self.code,
            fields: vec![name],
        })?;
        from_value(v).map_err(|e| MessageError::MalformedField {
            code: self.code,
            field: name,
            reason: e.to_string(),
        })
    }
}
