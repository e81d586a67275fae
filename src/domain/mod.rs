/*
Domain model for reconciliation and privacy amplification.

Pure data structures plus the invariants that can be checked without I/O:
parameter ranges, bit-valued collections, discard-flag semantics and key
assembly. Protocol encoding lives in `protocol`; orchestration in
`application`.

Secret-bearing values (`ReconciledKey`, `FinalKey`, `Frame`, `Seed`) zeroize on
drop and never print their contents through `Debug`.
*/

pub mod amplification;
pub mod errors;
pub mod keys;
pub mod reconciliation;
pub mod role;
pub mod symbols;

pub use amplification::{AmplificationRequest, SecretKeyRatio, Seed};
pub use errors::DomainError;
pub use keys::{FinalKey, ReconciledKey};
pub use reconciliation::*;
pub use role::Role;
pub use symbols::SymbolSequence;
