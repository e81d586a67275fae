use rand_core::CryptoRngCore;
use thiserror::Error;

use crate::domain::{FinalKey, ReconciledKey, Seed};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractorError {
    #[error("empty input key")]
    EmptyInput,
    #[error("no output produced: requested {output} bits from {input}")]
    NoOutput { input: usize, output: usize },
    #[error("output length {output} exceeds input length {input}")]
    OutputTooLong { input: usize, output: usize },
    #[error("seed length mismatch: expected {expected}, got {actual}")]
    SeedLength { expected: usize, actual: usize },
}

/// Seeded randomness extractor.
///
/// Implementations are deterministic in `(input, output_len, seed)`: both
/// parties must compute the same output from the same public seed.
pub trait Extractor {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Seed length required to map `input_len` bits onto `output_len` bits.
    ///
    /// # Errors
    /// [`ExtractorError`] if the pair of lengths is not supported.
    fn required_seed_length(
        &self,
        input_len: usize,
        output_len: usize,
    ) -> Result<usize, ExtractorError>;

    /// Compress `input` to `output_len` bits using `seed`.
    ///
    /// # Errors
    /// [`ExtractorError`] on unsupported lengths or a seed of the wrong size.
    fn extract(
        &self,
        input: &ReconciledKey,
        output_len: usize,
        seed: &Seed,
    ) -> Result<FinalKey, ExtractorError>;

    /// Draw a seed of the required length from `rng`, then extract.
    ///
    /// # Errors
    /// As [`extract`](Extractor::extract).
    fn extract_with_fresh_seed(
        &self,
        input: &ReconciledKey,
        output_len: usize,
        rng: &mut dyn CryptoRngCore,
    ) -> Result<(FinalKey, Seed), ExtractorError> {
        let seed_len = self.required_seed_length(input.len(), output_len)?;
        let seed = Seed::random(seed_len, rng);
        let key = self.extract(input, output_len, &seed)?;
        Ok((key, seed))
    }
}
