use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Dimension of the multidimensional reconciliation rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MdrDimension(u32);

impl MdrDimension {
    pub const SUPPORTED: [u32; 4] = [1, 2, 4, 8];

    /// # Errors
    /// Returns [`DomainError::InvalidDimension`] unless `d` is 1, 2, 4 or 8.
    pub fn new(d: u32) -> Result<Self, DomainError> {
        if Self::SUPPORTED.contains(&d) {
            Ok(Self(d))
        } else {
            Err(DomainError::InvalidDimension(d))
        }
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Same value as a `usize` for slicing arithmetic.
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u32> for MdrDimension {
    type Error = DomainError;
    fn try_from(v: u32) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<MdrDimension> for u32 {
    fn from(d: MdrDimension) -> Self {
        d.0
    }
}

/// Reconciliation efficiency; the engine derives its code rate from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Beta(f64);

impl Beta {
    /// # Errors
    /// Returns [`DomainError::InvalidBeta`] unless `0 < beta <= 1`.
    pub fn new(beta: f64) -> Result<Self, DomainError> {
        if beta.is_finite() && beta > 0.0 && beta <= 1.0 {
            Ok(Self(beta))
        } else {
            Err(DomainError::InvalidBeta(beta))
        }
    }

    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Beta {
    type Error = DomainError;
    fn try_from(v: f64) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<Beta> for f64 {
    fn from(b: Beta) -> Self {
        b.0
    }
}

/// Signal-to-noise ratio measured on the quantum data (linear scale).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SignalToNoiseRatio(f64);

impl SignalToNoiseRatio {
    /// # Errors
    /// Returns [`DomainError::InvalidSnr`] unless `snr > 0` and finite.
    pub fn new(snr: f64) -> Result<Self, DomainError> {
        if snr.is_finite() && snr > 0.0 {
            Ok(Self(snr))
        } else {
            Err(DomainError::InvalidSnr(snr))
        }
    }

    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for SignalToNoiseRatio {
    type Error = DomainError;
    fn try_from(v: f64) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<SignalToNoiseRatio> for f64 {
    fn from(s: SignalToNoiseRatio) -> Self {
        s.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_bounds() {
        for d in MdrDimension::SUPPORTED {
            assert_eq!(MdrDimension::new(d).unwrap().get(), d);
        }
        assert_eq!(MdrDimension::new(3), Err(DomainError::InvalidDimension(3)));
        assert!(MdrDimension::new(0).is_err());
    }

    #[test]
    fn beta_bounds() {
        assert!(Beta::new(0.95).is_ok());
        assert!(Beta::new(1.0).is_ok());
        assert!(Beta::new(0.0).is_err());
        assert!(Beta::new(1.01).is_err());
        assert!(Beta::new(f64::NAN).is_err());
    }

    #[test]
    fn snr_bounds() {
        assert!(SignalToNoiseRatio::new(0.3).is_ok());
        assert!(SignalToNoiseRatio::new(0.0).is_err());
        assert!(SignalToNoiseRatio::new(f64::INFINITY).is_err());
    }

    #[test]
    fn serde_validates() {
        assert!(serde_json::from_str::<MdrDimension>("8").is_ok());
        assert!(serde_json::from_str::<MdrDimension>("5").is_err());
        assert!(serde_json::from_str::<Beta>("-0.5").is_err());
    }
}
