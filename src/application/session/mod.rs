//! Bridging boundary: local request in, one control session, key out.
//!
//! Restarting after failures is decided here by [`RestartPolicy`], never
//! inside the protocols.

pub mod runner;
pub mod state;
pub mod supervisor;

pub use runner::*;
pub use state::*;
pub use supervisor::*;
