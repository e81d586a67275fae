//! Control protocol vocabulary: codes, envelopes, typed messages and their
//! byte form.

pub mod codes;
pub mod frame;
pub mod message;

pub use codes::{ControlCode, UnknownCode};
pub use frame::{FrameError, decode_envelope, encode_envelope};
pub use message::{ControlMessage, Envelope, MessageError};
