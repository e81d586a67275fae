use thiserror::Error;

use crate::domain::{DomainError, Role};
use crate::ports::{ChannelPortError, EngineError, ExtractorError, RequestSourceError};
use crate::protocol::{ControlCode, MessageError};

use super::reconciliation::{ReconciliationEvent, ReconciliationState};

/// Why a reconciliation round produced no key.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// A required field was absent or malformed in a message we received.
    #[error("invalid content: {0}")]
    InvalidContent(#[source] MessageError),

    #[error("unexpected command: expected {expected}, got {got}")]
    UnexpectedCommand {
        expected: ControlCode,
        got: ControlCode,
    },

    /// The peer answered with an error outcome.
    #[error("peer aborted with {code}: {}", message.as_deref().unwrap_or("no reason given"))]
    PeerAborted {
        code: ControlCode,
        message: Option<String>,
    },

    #[error("error correction failed: {0}")]
    Engine(#[from] EngineError),

    #[error("key assembly failed: {0}")]
    Assembly(#[from] DomainError),

    #[error("channel error: {0}")]
    Channel(#[from] ChannelPortError),

    #[error("invalid transition for {role}: {event:?} in {state:?}")]
    InvalidTransition {
        role: Role,
        state: ReconciliationState,
        event: ReconciliationEvent,
    },
}

/// Why privacy amplification produced no key.
#[derive(Debug, Error)]
pub enum AmplificationError {
    #[error("invalid content: {0}")]
    InvalidContent(#[source] MessageError),

    #[error("unexpected command: expected {expected}, got {got}")]
    UnexpectedCommand {
        expected: ControlCode,
        got: ControlCode,
    },

    /// The peer did not confirm with a success outcome.
    #[error("peer did not confirm ({code}): {}", message.as_deref().unwrap_or("no reason given"))]
    NotConfirmed {
        code: ControlCode,
        message: Option<String>,
    },

    #[error("extraction failed: {0}")]
    Extractor(#[from] ExtractorError),

    #[error("channel error: {0}")]
    Channel(#[from] ChannelPortError),
}

/// Failure of one bridged session (intake, connection or either protocol).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("reconciliation: {0}")]
    Reconciliation(#[from] ReconciliationError),

    #[error("privacy amplification: {0}")]
    Amplification(#[from] AmplificationError),

    #[error("control channel: {0}")]
    Channel(#[from] ChannelPortError),

    #[error("local request: {0}")]
    Request(#[from] RequestSourceError),

    #[error("peer ended the session before privacy amplification")]
    PeerSkippedAmplification,

    #[error("invalid session transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: super::session::SessionState,
        to: super::session::SessionState,
    },
}
