//! Bit-vector helpers.
//!
//! Keys, frames and seeds travel as one `u8` per bit (0 or 1) to stay close
//! to what the error-correction engine emits. [`PackedBits`] is the dense
//! working representation used where per-bit loops would be too slow.

use zeroize::{Zeroize, ZeroizeOnDrop};

const WORD: usize = 64;

/// Index of the first element that is neither 0 nor 1.
#[must_use]
pub fn first_non_binary(bits: &[u8]) -> Option<usize> {
    bits.iter().position(|b| *b > 1)
}

/// Dense little-endian bit vector. Bit `i` lives in `words[i / 64]` at
/// position `i % 64`. Bits past `len` are always zero.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PackedBits {
    words: Vec<u64>,
    len: usize,
}

impl std::fmt::Debug for PackedBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PackedBits(len={})", self.len)
    }
}

impl PackedBits {
    /// Pack a slice of 0/1 bytes. Any non-zero byte is treated as 1.
    #[must_use]
    pub fn from_bits(bits: &[u8]) -> Self {
        let mut words = vec![0u64; bits.len().div_ceil(WORD)];
        for (i, b) in bits.iter().enumerate() {
            if *b != 0 {
                words[i / WORD] |= 1u64 << (i % WORD);
            }
        }
        Self { words, len: bits.len() }
    }

    /// Pack `bits` in reverse order (bit `i` of the result is `bits[len-1-i]`).
    #[must_use]
    pub fn from_bits_reversed(bits: &[u8]) -> Self {
        let mut words = vec![0u64; bits.len().div_ceil(WORD)];
        for (i, b) in bits.iter().rev().enumerate() {
            if *b != 0 {
                words[i / WORD] |= 1u64 << (i % WORD);
            }
        }
        Self { words, len: bits.len() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Single bit lookup; out-of-range reads return `false`.
    #[must_use]
    pub fn get(&self, i: usize) -> bool {
        i < self.len && (self.words[i / WORD] >> (i % WORD)) & 1 == 1
    }

    /// 64 bits starting at `offset` (bit `offset` lands at position 0).
    /// Positions beyond `len` read as zero.
    #[must_use]
    pub fn word_at(&self, offset: usize) -> u64 {
        let idx = offset / WORD;
        let shift = offset % WORD;
        let lo = self.words.get(idx).copied().unwrap_or(0);
        if shift == 0 {
            return lo;
        }
        let hi = self.words.get(idx + 1).copied().unwrap_or(0);
        (lo >> shift) | (hi << (WORD - shift))
    }

    /// Parity of `self[offset .. offset + other.len()] AND other`.
    #[must_use]
    pub fn windowed_dot(&self, offset: usize, other: &PackedBits) -> bool {
        let mut acc = 0u64;
        for (k, w) in other.words.iter().enumerate() {
            acc ^= self.word_at(offset + k * WORD) & w;
        }
        acc.count_ones() % 2 == 1
    }
}
