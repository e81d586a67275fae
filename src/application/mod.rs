pub mod amplification;
pub mod errors;
pub mod reconciliation;
pub(crate) mod run;
pub mod session;

pub use amplification::{amplify_initiator, amplify_responder, amplify_responder_with};
pub use errors::*;
pub use reconciliation::{
    InitiatorParams, ReconciliationEvent, ReconciliationFsm, ReconciliationState,
    reconcile_initiator, reconcile_responder, reconcile_responder_with,
};
pub use session::{
    AliceSession, BobSession, RestartPolicy, Session, SessionState, Supervisor, SupervisorExit,
    SupervisorReport,
};
