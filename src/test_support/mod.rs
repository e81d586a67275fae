//! Builders and test doubles shared by unit and integration tests.
//!
//! Compiled for this crate's tests and, with the `test-support` feature, for
//! the integration tests under `tests/`.
#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

pub mod doubles;
pub mod support;

pub use doubles::*;
pub use support::*;
