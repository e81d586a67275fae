use thiserror::Error;

/// Semantic validation failures for domain values.
///
/// Raised by constructors so that an out-of-range parameter is caught where
/// it enters the system (config, local request, decoded payload) rather than
/// deep inside a protocol run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// MDR dimension outside the supported set.
    #[error("mdr_dimension must be one of 1, 2, 4, 8 (got {0})")]
    InvalidDimension(u32),
    /// Reconciliation efficiency outside `(0, 1]` or not finite.
    #[error("beta must be finite and in (0, 1] (got {0})")]
    InvalidBeta(f64),
    /// SNR not strictly positive or not finite.
    #[error("signal_to_noise_ratio must be finite and > 0 (got {0})")]
    InvalidSnr(f64),
    /// Secret key ratio outside `[0, 1]` or not finite.
    #[error("secret_key_ratio must be finite and in [0, 1] (got {0})")]
    InvalidSecretKeyRatio(f64),
    /// A bit-valued field contained something other than 0 or 1.
    #[error("{field} must only contain 0/1 values (index {index})")]
    NonBinary { field: &'static str, index: usize },
    /// Two collections that must be aligned have different lengths.
    #[error("{field} length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A symbol sequence with no symbols.
    #[error("symbol sequence is empty")]
    EmptySymbols,
}
