use crate::application::errors::SessionError;

/// Lifecycle of the bridging service around one protocol session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    AwaitingRequest,
    RunningProtocol,
    Done,
    Failed,
}

impl SessionState {
    /// Allowed moves. A finished session (either way) goes back to waiting
    /// for the next request; only the supervisor returns to `Idle`.
    #[must_use]
    pub fn can_transition(self, next: SessionState) -> bool {
        use SessionState::{AwaitingRequest, Done, Failed, Idle, RunningProtocol};
        matches!(
            (self, next),
            (Idle, AwaitingRequest)
                | (AwaitingRequest, RunningProtocol | Failed | Idle)
                | (RunningProtocol, Done | Failed)
                | (Done | Failed, AwaitingRequest | Idle)
        )
    }
}

/// Current session state with checked transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTracker {
    state: SessionState,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }
}

impl SessionTracker {
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// # Errors
    /// [`SessionError::InvalidTransition`] if `next` is not reachable.
    pub fn transition(&mut self, next: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition(next) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!(from = ?self.state, to = ?next, "session state");
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_cycle() {
        let mut t = SessionTracker::default();
        for next in [
            SessionState::AwaitingRequest,
            SessionState::RunningProtocol,
            SessionState::Done,
            SessionState::AwaitingRequest,
            SessionState::RunningProtocol,
            SessionState::Failed,
            SessionState::Idle,
        ] {
            t.transition(next).unwrap();
        }
        assert_eq!(t.state(), SessionState::Idle);
    }

    #[test]
    fn can_transition_negative_cases() {
        assert!(!SessionState::Idle.can_transition(SessionState::RunningProtocol));
        assert!(!SessionState::Done.can_transition(SessionState::RunningProtocol));
        assert!(!SessionState::RunningProtocol.can_transition(SessionState::AwaitingRequest));
        assert!(!SessionState::Failed.can_transition(SessionState::Done));
    }

    #[test]
    fn invalid_transition_leaves_state() {
        let mut t = SessionTracker::default();
        let err = t.transition(SessionState::Done).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: SessionState::Idle,
                to: SessionState::Done
            }
        ));
        assert_eq!(t.state(), SessionState::Idle);
    }
}
