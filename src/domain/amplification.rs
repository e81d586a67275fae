use rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::bits::first_non_binary;
use crate::domain::errors::DomainError;

/// Fraction of reconciled bits kept as secret key (bits per reconciled bit).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SecretKeyRatio(f64);

impl SecretKeyRatio {
    /// # Errors
    /// Returns [`DomainError::InvalidSecretKeyRatio`] unless `0 <= r <= 1`.
    pub fn new(r: f64) -> Result<Self, DomainError> {
        if r.is_finite() && (0.0..=1.0).contains(&r) {
            Ok(Self(r))
        } else {
            Err(DomainError::InvalidSecretKeyRatio(r))
        }
    }

    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }

    /// Target extractor output length: `floor(input_len * ratio)`.
    ///
    /// Both parties call this with the same inputs; the float-to-int cast
    /// truncates toward zero, which is the rule the peer applies too.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn final_key_len(self, input_len: usize) -> usize {
        (input_len as f64 * self.0) as usize
    }
}

impl TryFrom<f64> for SecretKeyRatio {
    type Error = DomainError;
    fn try_from(v: f64) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<SecretKeyRatio> for f64 {
    fn from(r: SecretKeyRatio) -> Self {
        r.0
    }
}

/// Public extractor seed (one byte per bit).
///
/// Not secret once sent, but it is scoped to the run like the keys it shapes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Seed(Vec<u8>);

impl Seed {
    /// # Errors
    /// Returns [`DomainError::NonBinary`] if any element is not 0 or 1.
    pub fn new(bits: Vec<u8>) -> Result<Self, DomainError> {
        if let Some(index) = first_non_binary(&bits) {
            return Err(DomainError::NonBinary { field: "seed", index });
        }
        Ok(Self(bits))
    }

    /// Draw `len` uniformly random bits from `rng`.
    #[must_use]
    pub fn random<R: CryptoRngCore + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut bytes = vec![0u8; len.div_ceil(8)];
        rng.fill_bytes(&mut bytes);
        let bits = (0..len).map(|i| (bytes[i / 8] >> (i % 8)) & 1).collect();
        bytes.zeroize();
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

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed(len={})", self.0.len())
    }
}

impl TryFrom<Vec<u8>> for Seed {
    type Error = DomainError;
    fn try_from(v: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<Seed> for Vec<u8> {
    fn from(s: Seed) -> Self {
        s.0.clone()
    }
}

/// `AMPLIFICATION_REQUEST`: initiator → responder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmplificationRequest {
    pub seed: Seed,
    pub secret_key_ratio: SecretKeyRatio,
}

impl AmplificationRequest {
    pub const FIELDS: [&'static str; 2] = ["seed", "secret_key_ratio"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CountingRng;
    use proptest::prelude::*;

    #[test]
    fn ratio_bounds() {
        assert!(SecretKeyRatio::new(0.0).is_ok());
        assert!(SecretKeyRatio::new(1.0).is_ok());
        assert!(SecretKeyRatio::new(-0.1).is_err());
        assert!(SecretKeyRatio::new(1.5).is_err());
        assert!(SecretKeyRatio::new(f64::NAN).is_err());
    }

    #[test]
    fn final_len_truncates() {
        let half = SecretKeyRatio::new(0.5).unwrap();
        assert_eq!(half.final_key_len(1000), 500);
        assert_eq!(half.final_key_len(999), 499);
        let r = SecretKeyRatio::new(0.333).unwrap();
        assert_eq!(r.final_key_len(10), 3);
        assert_eq!(SecretKeyRatio::new(0.0).unwrap().final_key_len(77), 0);
    }

    #[test]
    fn random_seed_has_requested_len_and_is_binary() {
        let mut rng = CountingRng::default();
        let s = Seed::random(77, &mut rng);
        assert_eq!(s.len(), 77);
        assert!(s.bits().iter().all(|b| *b <= 1));
    }

    #[test]
    fn seed_rejects_non_binary() {
        assert!(Seed::new(vec![0, 1, 2]).is_err());
        assert!(serde_json::from_str::<Seed>("[0,1,5]").is_err());
    }

    proptest! {
        #[test]
        fn prop_final_len_never_exceeds_input(n in 0usize..1_000_000, r in 0.0f64..=1.0) {
            let ratio = SecretKeyRatio::new(r).unwrap();
            let m = ratio.final_key_len(n);
            prop_assert!(m <= n);
            prop_assert_eq!(m, (n as f64 * r).floor() as usize);
        }
    }
}
