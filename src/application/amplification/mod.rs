//! Single-round privacy amplification.
//!
//! The initiator owns seed generation: it extracts first, then sends the seed
//! and ratio so the responder can apply the identical extraction. Only a
//! success outcome from the responder makes the initiator's key usable.

pub mod initiator;
pub mod responder;

pub use initiator::*;
pub use responder::*;
