//! Multi-round error reconciliation between initiator (Bob) and responder
//! (Alice).
//!
//! Message flow:
//!
//! ```text
//! Bob                                   Alice
//!  | RECONCILIATION_INITIALIZATION  -->  |  decode_and_verify
//!  | <--  RECONCILIATION_VERIFICATION    |
//!  | verify_and_merge                    |
//!  | RECONCILIATION_DISCARD_FLAGS   -->  |  assemble kept frames
//!  | <--  RECONCILIATION_FINISHED        |
//! ```
//!
//! Both sides hold a reconciled key only after the final exchange; any
//! earlier abort leaves neither with a key.

pub mod fsm_machine;
#[cfg(test)]
mod fsm_tests;
pub mod fsm_types;
pub mod initiator;
pub mod responder;

pub use fsm_machine::*;
pub use fsm_types::*;
pub use initiator::*;
pub use responder::*;
