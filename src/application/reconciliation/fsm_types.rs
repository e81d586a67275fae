/// Coarse progress of one reconciliation round.
///
/// Responder path: `Idle → AwaitingInit → Decoded → AwaitingDiscardFlags →
/// Finished`. Initiator path: `Idle → Encoded → AwaitingVerification →
/// Merged → Finished`. Any non-terminal state may move to `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconciliationState {
    Idle,
    /// Responder waits for `RECONCILIATION_INITIALIZATION`.
    AwaitingInit,
    /// Initiator holds side information and raw frames.
    Encoded,
    /// Responder holds checksums, discard flags and decoded frames.
    Decoded,
    /// Initiator sent its side information and waits for checksums.
    AwaitingVerification,
    /// Responder sent checksums and waits for the merged verdict.
    AwaitingDiscardFlags,
    /// Initiator holds the merged verdict and its final frames.
    Merged,
    Finished,
    Aborted,
}

impl ReconciliationState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReconciliationState::Idle => "idle",
            ReconciliationState::AwaitingInit => "awaiting-init",
            ReconciliationState::Encoded => "encoded",
            ReconciliationState::Decoded => "decoded",
            ReconciliationState::AwaitingVerification => "awaiting-verification",
            ReconciliationState::AwaitingDiscardFlags => "awaiting-discard-flags",
            ReconciliationState::Merged => "merged",
            ReconciliationState::Finished => "finished",
            ReconciliationState::Aborted => "aborted",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReconciliationState::Finished | ReconciliationState::Aborted
        )
    }
}

/// Logical triggers; not on-wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconciliationEvent {
    ResponderBegin,
    ResponderDecoded,
    ResponderSentVerification,
    ResponderFinished,
    InitiatorEncoded,
    InitiatorSentInit,
    InitiatorMerged,
    InitiatorAcknowledged,
    Abort,
}
