//! Closed set of control-protocol codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Request / outcome code carried by every control message.
///
/// Numeric values are part of the wire format. Generic outcomes live in
/// `0x00xx`, reconciliation in `0x03xx`, privacy amplification in `0x04xx`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum ControlCode {
    InvalidContent = 0x0001,
    UnexpectedCommand = 0x0002,

    ReconciliationInitialization = 0x0301,
    ReconciliationVerification = 0x0302,
    ReconciliationDiscardFlags = 0x0303,
    ReconciliationFinished = 0x0304,
    ReconciliationError = 0x0305,

    AmplificationRequest = 0x0401,
    AmplificationSuccess = 0x0402,
    AmplificationError = 0x0403,
}

/// Numeric value outside the closed [`ControlCode`] set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown control code: 0x{0:04x}")]
pub struct UnknownCode(pub u16);

impl ControlCode {
    pub const ALL: [ControlCode; 10] = [
        ControlCode::InvalidContent,
        ControlCode::UnexpectedCommand,
        ControlCode::ReconciliationInitialization,
        ControlCode::ReconciliationVerification,
        ControlCode::ReconciliationDiscardFlags,
        ControlCode::ReconciliationFinished,
        ControlCode::ReconciliationError,
        ControlCode::AmplificationRequest,
        ControlCode::AmplificationSuccess,
        ControlCode::AmplificationError,
    ];

    #[must_use]
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Upper-case protocol name, as written in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ControlCode::InvalidContent => "INVALID_CONTENT",
            ControlCode::UnexpectedCommand => "UNEXPECTED_COMMAND",
            ControlCode::ReconciliationInitialization => "EC_INITIALIZATION",
            ControlCode::ReconciliationVerification => "EC_VERIFICATION",
            ControlCode::ReconciliationDiscardFlags => "EC_DISCARD_FLAGS",
            ControlCode::ReconciliationFinished => "EC_FINISHED",
            ControlCode::ReconciliationError => "EC_ERROR",
            ControlCode::AmplificationRequest => "PA_REQUEST",
            ControlCode::AmplificationSuccess => "PA_SUCCESS",
            ControlCode::AmplificationError => "PA_ERROR",
        }
    }
}

impl TryFrom<u16> for ControlCode {
    type Error = UnknownCode;
    fn try_from(v: u16) -> Result<Self, Self::Error> {
        ControlCode::ALL
            .into_iter()
            .find(|c| c.as_u16() == v)
            .ok_or(UnknownCode(v))
    }
}

impl From<ControlCode> for u16 {
    fn from(c: ControlCode) -> Self {
        c.as_u16()
    }
}

impl fmt::Display for ControlCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn values_are_distinct_and_invertible() {
        let mut seen = HashSet::new();
        for c in ControlCode::ALL {
            assert!(seen.insert(c.as_u16()), "duplicate value for {c}");
            assert_eq!(ControlCode::try_from(c.as_u16()), Ok(c));
        }
    }

    #[test]
    fn unknown_value_rejected() {
        assert_eq!(ControlCode::try_from(0xbeef), Err(UnknownCode(0xbeef)));
        assert_eq!(format!("{}", UnknownCode(0x10)), "unknown control code: 0x0010");
    }
}
