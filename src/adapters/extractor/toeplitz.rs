// src/adapters/extractor/toeplitz.rs
use crate::core::bits::PackedBits;
use crate::domain::{FinalKey, ReconciledKey, Seed};
use crate::ports::{Extractor, ExtractorError};

/// Toeplitz-hash extractor.
///
/// For input length `n` and output length `m` the seed has `n + m - 1` bits
/// and defines the `m x n` Toeplitz matrix `T[i][j] = seed[i - j + n - 1]`.
/// Output bit `i` is the GF(2) dot product of row `i` with the input.
///
/// Row `i` read left to right is `seed[i + n - 1], seed[i + n - 2], ..,
/// seed[i]`, i.e. a contiguous window of the reversed seed starting at
/// `m - 1 - i`. Packing the seed reversed once lets every row be evaluated
/// with word-wide AND + popcount.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToeplitzExtractor;

impl ToeplitzExtractor {
    fn check_lengths(input_len: usize, output_len: usize) -> Result<(), ExtractorError> {
        if input_len == 0 {
            return Err(ExtractorError::EmptyInput);
        }
        if output_len == 0 {
            return Err(ExtractorError::NoOutput {
                input: input_len,
                output: output_len,
            });
        }
        if output_len > input_len {
            return Err(ExtractorError::OutputTooLong {
                input: input_len,
                output: output_len,
            });
        }
        Ok(())
    }
}

impl Extractor for ToeplitzExtractor {
    fn name(&self) -> &'static str {
        "toeplitz"
    }

    fn required_seed_length(
        &self,
        input_len: usize,
        output_len: usize,
    ) -> Result<usize, ExtractorError> {
        Self::check_lengths(input_len, output_len)?;
        Ok(input_len + output_len - 1)
    }

    fn extract(
        &self,
        input: &ReconciledKey,
        output_len: usize,
        seed: &Seed,
    ) -> Result<FinalKey, ExtractorError> {
        let expected = self.required_seed_length(input.len(), output_len)?;
        if seed.len() != expected {
            return Err(ExtractorError::SeedLength {
                expected,
                actual: seed.len(),
            });
        }
        tracing::debug!(
            input_len = input.len(),
            output_len,
            "extracting with toeplitz hash"
        );
        let x = PackedBits::from_bits(input.bits());
        let reversed_seed = PackedBits::from_bits_reversed(seed.bits());
        let out = (0..output_len)
            .map(|i| u8::from(reversed_seed.windowed_dot(output_len - 1 - i, &x)))
            .collect();
        Ok(FinalKey::from_trusted_bits(out))
    }
}
