use crate::application::errors::ReconciliationError;
use crate::domain::Role;
use crate::ports::{ProtocolEvent, ProtocolObserver, Stage};

use super::fsm_types::{ReconciliationEvent, ReconciliationState};

/// Transition table for one reconciliation round.
///
/// Holds no protocol data; the procedures in `responder` / `initiator` own
/// their working set and drive this machine so that an out-of-order step is
/// an error instead of a silently corrupted key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationFsm {
    role: Role,
    state: ReconciliationState,
}

impl ReconciliationFsm {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            state: ReconciliationState::Idle,
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn state(&self) -> ReconciliationState {
        self.state
    }

    fn state_ordinal(state: ReconciliationState) -> u8 {
        match state {
            ReconciliationState::Idle => 0,
            ReconciliationState::AwaitingInit | ReconciliationState::Encoded => 1,
            ReconciliationState::Decoded | ReconciliationState::AwaitingVerification => 2,
            ReconciliationState::AwaitingDiscardFlags | ReconciliationState::Merged => 3,
            ReconciliationState::Finished | ReconciliationState::Aborted => 4,
        }
    }

    /// Apply `ev`, returning the `(from, to)` pair on success.
    ///
    /// # Errors
    /// [`ReconciliationError::InvalidTransition`] if `ev` is not allowed for
    /// this role in the current state. The state is left unchanged.
    pub fn apply(
        &mut self,
        ev: ReconciliationEvent,
    ) -> Result<(ReconciliationState, ReconciliationState), ReconciliationError> {
        use ReconciliationEvent as E;
        use ReconciliationState as S;

        let old = self.state;
        let new = match (self.role, old, ev) {
            (Role::Responder, S::Idle, E::ResponderBegin) => S::AwaitingInit,
            (Role::Responder, S::AwaitingInit, E::ResponderDecoded) => S::Decoded,
            (Role::Responder, S::Decoded, E::ResponderSentVerification) => S::AwaitingDiscardFlags,
            (Role::Responder, S::AwaitingDiscardFlags, E::ResponderFinished) => S::Finished,
            (Role::Initiator, S::Idle, E::InitiatorEncoded) => S::Encoded,
            (Role::Initiator, S::Encoded, E::InitiatorSentInit) => S::AwaitingVerification,
            (Role::Initiator, S::AwaitingVerification, E::InitiatorMerged) => S::Merged,
            (Role::Initiator, S::Merged, E::InitiatorAcknowledged) => S::Finished,
            (_, s, E::Abort) if !s.is_terminal() => S::Aborted,
            _ => {
                return Err(ReconciliationError::InvalidTransition {
                    role: self.role,
                    state: old,
                    event: ev,
                });
            }
        };
        debug_assert!(
            Self::state_ordinal(new) >= Self::state_ordinal(old),
            "state regression: {old:?} -> {new:?}"
        );
        self.state = new;
        Ok((old, new))
    }

    /// [`apply`](Self::apply) and report the transition to `observer`.
    ///
    /// # Errors
    /// As [`apply`](Self::apply).
    pub fn advance(
        &mut self,
        ev: ReconciliationEvent,
        observer: &dyn ProtocolObserver,
    ) -> Result<(), ReconciliationError> {
        let (from, to) = self.apply(ev)?;
        observer.on_event(&ProtocolEvent::Transition {
            stage: Stage::Reconciliation,
            from: from.as_str(),
            to: to.as_str(),
        });
        Ok(())
    }

    /// Move to `Aborted` unless the round already ended.
    pub fn abort(&mut self, observer: &dyn ProtocolObserver) {
        if !self.state.is_terminal() {
            let _ = self.advance(ReconciliationEvent::Abort, observer);
        }
    }
}
