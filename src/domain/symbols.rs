use num_complex::Complex64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::errors::DomainError;

/// Measured quadratures for one party, one entry per quantum channel use.
///
/// Immutable once built. The reconciliation procedures expect real-valued
/// symbols; complex input is accepted so that a caller feeding raw IQ data
/// can be warned instead of silently truncated.
#[derive(Clone, PartialEq)]
pub struct SymbolSequence(Vec<Complex64>);

impl SymbolSequence {
    /// Build from real-valued measurements.
    ///
    /// # Errors
    /// Returns [`DomainError::EmptySymbols`] for an empty input.
    pub fn from_real(values: Vec<f64>) -> Result<Self, DomainError> {
        Self::from_complex(values.into_iter().map(|re| Complex64::new(re, 0.0)).collect())
    }

    /// Build from complex measurements.
    ///
    /// # Errors
    /// Returns [`DomainError::EmptySymbols`] for an empty input.
    pub fn from_complex(values: Vec<Complex64>) -> Result<Self, DomainError> {
        if values.is_empty() {
            return Err(DomainError::EmptySymbols);
        }
        Ok(Self(values))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if any symbol carries a non-zero imaginary component.
    #[must_use]
    pub fn has_imaginary_part(&self) -> bool {
        self.0.iter().any(|c| c.im != 0.0)
    }

    /// Real parts in original order (what the engine consumes).
    #[must_use]
    pub fn real_parts(&self) -> Vec<f64> {
        self.0.iter().map(|c| c.re).collect()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Complex64] {
        &self.0
    }
}

impl fmt::Debug for SymbolSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolSequence(len={})", self.0.len())
    }
}

/// Accepted JSON / CBOR shapes: `[x0, x1, ...]` or `[[re, im], ...]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SymbolsRepr {
    Real(Vec<f64>),
    Complex(Vec<[f64; 2]>),
}

impl<'de> Deserialize<'de> for SymbolSequence {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let built = match SymbolsRepr::deserialize(d)? {
            SymbolsRepr::Real(v) => Self::from_real(v),
            SymbolsRepr::Complex(v) => {
                Self::from_complex(v.into_iter().map(|[re, im]| Complex64::new(re, im)).collect())
            }
        };
        built.map_err(serde::de::Error::custom)
    }
}

impl Serialize for SymbolSequence {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if self.has_imaginary_part() {
            let pairs: Vec<[f64; 2]> = self.0.iter().map(|c| [c.re, c.im]).collect();
            pairs.serialize(s)
        } else {
            self.real_parts().serialize(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rejected() {
        assert_eq!(SymbolSequence::from_real(vec![]), Err(DomainError::EmptySymbols));
    }

    #[test]
    fn imaginary_detection() {
        let real = SymbolSequence::from_real(vec![0.1, -0.3]).unwrap();
        assert!(!real.has_imaginary_part());
        let cplx = SymbolSequence::from_complex(vec![
            Complex64::new(0.1, 0.0),
            Complex64::new(0.2, 0.5),
        ])
        .unwrap();
        assert!(cplx.has_imaginary_part());
        assert_eq!(cplx.real_parts(), vec![0.1, 0.2]);
    }

    #[test]
    fn json_accepts_both_shapes() {
        let real: SymbolSequence = serde_json::from_str("[1.0, -2.5]").unwrap();
        assert_eq!(real.real_parts(), vec![1.0, -2.5]);
        let cplx: SymbolSequence = serde_json::from_str("[[1.0, 0.5], [2.0, 0.0]]").unwrap();
        assert!(cplx.has_imaginary_part());
        assert!(serde_json::from_str::<SymbolSequence>("[]").is_err());
    }

    #[test]
    fn debug_hides_values() {
        let s = SymbolSequence::from_real(vec![0.123_456]).unwrap();
        assert_eq!(format!("{s:?}"), "SymbolSequence(len=1)");
    }
}
