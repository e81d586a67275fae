//! Payloads exchanged during a reconciliation round.
//!
//! The engine-produced side information (`ChannelMessage`, `Syndrome`,
//! `NormalizationVector`) is opaque here: the protocol moves it between the
//! parties unmodified and only the engine interprets it.

use serde::{Deserialize, Serialize};

use super::frame::{DiscardFlag, FrameChecksum};
use super::params::SignalToNoiseRatio;

/// Side information the responder needs to decode (MDR rotation output).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelMessage(pub Vec<f64>);

/// Per-frame parity information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Syndrome(pub Vec<Vec<u8>>);

/// Per-frame scaling values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizationVector(pub Vec<f64>);

impl ChannelMessage {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Syndrome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl NormalizationVector {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `RECONCILIATION_INITIALIZATION`: initiator → responder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationInit {
    pub channel_message: ChannelMessage,
    pub syndrome: Syndrome,
    pub normalization_vector: NormalizationVector,
    pub signal_to_noise_ratio: SignalToNoiseRatio,
}

impl ReconciliationInit {
    pub const FIELDS: [&'static str; 4] = [
        "channel_message",
        "syndrome",
        "normalization_vector",
        "signal_to_noise_ratio",
    ];
}

/// `RECONCILIATION_VERIFICATION`: responder → initiator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationVerification {
    pub crc_alice: Vec<FrameChecksum>,
    pub discard_flags: Vec<DiscardFlag>,
}

impl ReconciliationVerification {
    pub const FIELDS: [&'static str; 2] = ["crc_alice", "discard_flags"];
}

/// `RECONCILIATION_DISCARD_FLAGS`: initiator → responder, merged verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationDiscardFlags {
    pub final_discard_flags: Vec<DiscardFlag>,
}

impl ReconciliationDiscardFlags {
    pub const FIELDS: [&'static str; 1] = ["final_discard_flags"];
}

/// Human-readable reason attached to an error outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error_message: String,
}

impl ErrorReport {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error_message: msg.into(),
        }
    }
}
