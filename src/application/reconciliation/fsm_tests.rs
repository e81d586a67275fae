use super::*;
use crate::application::errors::ReconciliationError;
use crate::domain::Role;
use crate::test_support::RecordingObserver;

use ReconciliationEvent as E;
use ReconciliationState as S;

#[test]
fn responder_happy_path() {
    let obs = RecordingObserver::default();
    let mut fsm = ReconciliationFsm::new(Role::Responder);
    for ev in [
        E::ResponderBegin,
        E::ResponderDecoded,
        E::ResponderSentVerification,
        E::ResponderFinished,
    ] {
        fsm.advance(ev, &obs).unwrap();
    }
    assert_eq!(fsm.state(), S::Finished);
    assert_eq!(
        obs.transitions(),
        vec![
            ("idle", "awaiting-init"),
            ("awaiting-init", "decoded"),
            ("decoded", "awaiting-discard-flags"),
            ("awaiting-discard-flags", "finished"),
        ]
    );
}

#[test]
fn initiator_happy_path() {
    let mut fsm = ReconciliationFsm::new(Role::Initiator);
    assert_eq!(fsm.apply(E::InitiatorEncoded).unwrap(), (S::Idle, S::Encoded));
    assert_eq!(
        fsm.apply(E::InitiatorSentInit).unwrap(),
        (S::Encoded, S::AwaitingVerification)
    );
    assert_eq!(
        fsm.apply(E::InitiatorMerged).unwrap(),
        (S::AwaitingVerification, S::Merged)
    );
    assert_eq!(
        fsm.apply(E::InitiatorAcknowledged).unwrap(),
        (S::Merged, S::Finished)
    );
}

#[test]
fn role_events_do_not_cross() {
    let mut alice = ReconciliationFsm::new(Role::Responder);
    let err = alice.apply(E::InitiatorEncoded).unwrap_err();
    assert!(matches!(
        err,
        ReconciliationError::InvalidTransition {
            role: Role::Responder,
            state: S::Idle,
            event: E::InitiatorEncoded,
        }
    ));
    assert_eq!(alice.state(), S::Idle);

    let mut bob = ReconciliationFsm::new(Role::Initiator);
    assert!(bob.apply(E::ResponderBegin).is_err());
}

#[test]
fn steps_cannot_be_skipped() {
    let mut fsm = ReconciliationFsm::new(Role::Responder);
    fsm.apply(E::ResponderBegin).unwrap();
    assert!(fsm.apply(E::ResponderFinished).is_err());
    assert_eq!(fsm.state(), S::AwaitingInit);
}

#[test]
fn abort_from_any_live_state_only() {
    let obs = RecordingObserver::default();
    let mut fsm = ReconciliationFsm::new(Role::Initiator);
    fsm.apply(E::InitiatorEncoded).unwrap();
    fsm.abort(&obs);
    assert_eq!(fsm.state(), S::Aborted);
    assert!(fsm.apply(E::Abort).is_err());

    // Abort after completion leaves the outcome alone.
    let mut done = ReconciliationFsm::new(Role::Initiator);
    for ev in [
        E::InitiatorEncoded,
        E::InitiatorSentInit,
        E::InitiatorMerged,
        E::InitiatorAcknowledged,
    ] {
        done.apply(ev).unwrap();
    }
    done.abort(&obs);
    assert_eq!(done.state(), S::Finished);
    assert_eq!(obs.transitions(), vec![("encoded", "aborted")]);
}

#[test]
fn terminal_states() {
    assert!(S::Finished.is_terminal());
    assert!(S::Aborted.is_terminal());
    assert!(!S::Merged.is_terminal());
    assert!(!S::Idle.is_terminal());
}
