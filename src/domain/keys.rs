//! Secret-bearing outputs of a run.
//!
//! Both types own their bits exclusively, redact `Debug`, and zeroize on drop.
//! A value is only handed back to the caller once its stage succeeded on both
//! sides; everything else is dropped inside the run.

use serde::Serialize;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::bits::first_non_binary;
use crate::domain::errors::DomainError;

/// Bit-identical string shared by both parties after reconciliation.
#[derive(Clone, PartialEq, Eq, Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct ReconciledKey(Vec<u8>);

impl ReconciledKey {
    /// # Errors
    /// Returns [`DomainError::NonBinary`] if any element is not 0 or 1.
    pub fn new(bits: Vec<u8>) -> Result<Self, DomainError> {
        if let Some(index) = first_non_binary(&bits) {
            return Err(DomainError::NonBinary {
                field: "reconciled_key",
                index,
            });
        }
        Ok(Self(bits))
    }

    pub(crate) fn from_trusted_bits(bits: Vec<u8>) -> Self {
        Self(bits)
    }

    #[must_use]
    pub fn bits(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ReconciledKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReconciledKey(len={})", self.0.len())
    }
}

/// Extractor output; the terminal artifact of the pipeline.
#[derive(Clone, PartialEq, Eq, Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct FinalKey(Vec<u8>);

impl FinalKey {
    /// # Errors
    /// Returns [`DomainError::NonBinary`] if any element is not 0 or 1.
    pub fn new(bits: Vec<u8>) -> Result<Self, DomainError> {
        if let Some(index) = first_non_binary(&bits) {
            return Err(DomainError::NonBinary {
                field: "final_key",
                index,
            });
        }
        Ok(Self(bits))
    }

    pub(crate) fn from_trusted_bits(bits: Vec<u8>) -> Self {
        Self(bits)
    }

    #[must_use]
    pub fn bits(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for FinalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FinalKey(len={})", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_validate_bits() {
        assert!(ReconciledKey::new(vec![0, 1, 1]).is_ok());
        assert!(matches!(
            ReconciledKey::new(vec![0, 9]),
            Err(DomainError::NonBinary { index: 1, .. })
        ));
        assert!(FinalKey::new(vec![3]).is_err());
    }

    #[test]
    fn debug_redacts_bits() {
        let k = FinalKey::new(vec![1, 0, 1]).unwrap();
        assert_eq!(format!("{k:?}"), "FinalKey(len=3)");
        let r = ReconciledKey::new(vec![1; 10]).unwrap();
        assert_eq!(format!("{r:?}"), "ReconciledKey(len=10)");
    }

    #[test]
    fn final_key_serializes_as_bit_list() {
        let k = FinalKey::new(vec![1, 0]).unwrap();
        assert_eq!(serde_json::to_string(&k).unwrap(), "[1,0]");
    }
}
