//! Crate root for `cvqkd-pp`.
//!
//! Post-processing protocols of a continuous-variable QKD link: error
//! reconciliation followed by privacy amplification, run between Bob
//! (initiator) and Alice (responder) over an authenticated control channel.
//!
//! High-level tree:
//! * `core` – CBOR codec and bit helpers.
//! * `domain` – symbols, frames, keys, seeds and message payloads with their
//!   invariants.
//! * `ports` – boundary traits (control channel, error-correction engine,
//!   extractor, observer, local request source).
//! * `protocol` – control codes, envelopes, typed messages and byte framing.
//! * `application` – reconciliation and amplification procedures for both
//!   roles, and the session supervisor.
//! * `adapters` – in-memory and TCP channels, the parity-check engine, the
//!   Toeplitz extractor, the JSON-line local endpoint, the tracing observer.
//! * `config` – TOML service configuration.
pub mod adapters;
pub mod application;
pub mod config;
pub mod core;
pub mod domain;
pub mod ports;
pub mod protocol;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
