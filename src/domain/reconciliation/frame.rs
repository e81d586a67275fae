use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::bits::first_non_binary;
use crate::domain::errors::DomainError;
use crate::domain::keys::ReconciledKey;

/// Per-frame verdict on whether a decoded frame may enter the key.
///
/// Wire form is an unsigned integer: `0` keeps the frame, any non-zero value
/// discards it. Encoding always emits `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u64", into = "u8")]
pub enum DiscardFlag {
    Keep,
    Discard,
}

impl DiscardFlag {
    #[must_use]
    pub fn is_keep(self) -> bool {
        self == DiscardFlag::Keep
    }

    /// Logical OR of two verdicts: a frame survives only if both keep it.
    #[must_use]
    pub fn merge(self, other: DiscardFlag) -> DiscardFlag {
        if self.is_keep() && other.is_keep() {
            DiscardFlag::Keep
        } else {
            DiscardFlag::Discard
        }
    }
}

impl From<u64> for DiscardFlag {
    fn from(v: u64) -> Self {
        if v == 0 {
            DiscardFlag::Keep
        } else {
            DiscardFlag::Discard
        }
    }
}

impl From<DiscardFlag> for u8 {
    fn from(f: DiscardFlag) -> Self {
        match f {
            DiscardFlag::Keep => 0,
            DiscardFlag::Discard => 1,
        }
    }
}

/// Short integrity digest over one decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameChecksum(pub u32);

/// One error-correction unit worth of bits (each byte is 0 or 1).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Frame(Vec<u8>);

impl Frame {
    /// # Errors
    /// Returns [`DomainError::NonBinary`] if any element is not 0 or 1.
    pub fn new(bits: Vec<u8>) -> Result<Self, DomainError> {
        if let Some(index) = first_non_binary(&bits) {
            return Err(DomainError::NonBinary { field: "frame", index });
        }
        Ok(Self(bits))
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

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame(len={})", self.0.len())
    }
}

impl TryFrom<Vec<u8>> for Frame {
    type Error = DomainError;
    fn try_from(v: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<Frame> for Vec<u8> {
    fn from(f: Frame) -> Self {
        f.0.clone()
    }
}

/// Counts of kept / discarded frames for a final discard vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiscardSummary {
    pub kept: usize,
    pub discarded: usize,
}

impl DiscardSummary {
    #[must_use]
    pub fn of(flags: &[DiscardFlag]) -> Self {
        let kept = flags.iter().filter(|f| f.is_keep()).count();
        Self {
            kept,
            discarded: flags.len() - kept,
        }
    }
}

/// Flatten, in order, exactly the frames whose final flag is [`DiscardFlag::Keep`].
///
/// # Errors
/// Returns [`DomainError::LengthMismatch`] when `frames` and `flags` are not
/// aligned; no partial key is produced in that case.
pub fn assemble_reconciled_key(
    frames: &[Frame],
    flags: &[DiscardFlag],
) -> Result<ReconciledKey, DomainError> {
    if frames.len() != flags.len() {
        return Err(DomainError::LengthMismatch {
            field: "final_discard_flags",
            expected: frames.len(),
            actual: flags.len(),
        });
    }
    let bits = frames
        .iter()
        .zip(flags)
        .filter(|(_, flag)| flag.is_keep())
        .flat_map(|(frame, _)| frame.bits().iter().copied())
        .collect();
    Ok(ReconciledKey::from_trusted_bits(bits))
}

/// Flatten frames that were already filtered by the engine.
#[must_use]
pub fn flatten_frames(frames: &[Frame]) -> ReconciledKey {
    ReconciledKey::from_trusted_bits(frames.iter().flat_map(|f| f.bits().iter().copied()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(bits: &[u8]) -> Frame {
        Frame::new(bits.to_vec()).unwrap()
    }

    #[test]
    fn non_zero_wire_values_discard() {
        assert_eq!(DiscardFlag::from(0), DiscardFlag::Keep);
        assert_eq!(DiscardFlag::from(1), DiscardFlag::Discard);
        assert_eq!(DiscardFlag::from(42), DiscardFlag::Discard);
        let flags: Vec<DiscardFlag> = serde_json::from_str("[0, 3, 1, 0]").unwrap();
        assert_eq!(
            flags,
            vec![
                DiscardFlag::Keep,
                DiscardFlag::Discard,
                DiscardFlag::Discard,
                DiscardFlag::Keep
            ]
        );
        assert_eq!(serde_json::to_string(&flags).unwrap(), "[0,1,1,0]");
    }

    #[test]
    fn merge_is_or_of_discards() {
        use DiscardFlag::{Discard, Keep};
        assert_eq!(Keep.merge(Keep), Keep);
        assert_eq!(Keep.merge(Discard), Discard);
        assert_eq!(Discard.merge(Keep), Discard);
    }

    #[test]
    fn frame_rejects_non_binary() {
        assert_eq!(
            Frame::new(vec![0, 1, 2]),
            Err(DomainError::NonBinary { field: "frame", index: 2 })
        );
    }

    #[test]
    fn assemble_keeps_only_flag_zero() {
        let frames = vec![frame(&[1, 1]), frame(&[0, 1]), frame(&[1, 0])];
        let flags = vec![DiscardFlag::Keep, DiscardFlag::Discard, DiscardFlag::Keep];
        let key = assemble_reconciled_key(&frames, &flags).unwrap();
        assert_eq!(key.bits(), &[1, 1, 1, 0]);
    }

    #[test]
    fn assemble_rejects_misaligned_flags() {
        let frames = vec![frame(&[1])];
        let err = assemble_reconciled_key(&frames, &[]).unwrap_err();
        assert!(matches!(err, DomainError::LengthMismatch { expected: 1, actual: 0, .. }));
    }

    #[test]
    fn summary_counts() {
        let s = DiscardSummary::of(&[DiscardFlag::Keep, DiscardFlag::Discard, DiscardFlag::Keep]);
        assert_eq!(s, DiscardSummary { kept: 2, discarded: 1 });
    }

    proptest! {
        #[test]
        fn prop_assembled_key_is_concatenation_of_kept_frames(
            spec in prop::collection::vec(
                (prop::collection::vec(0u8..=1, 0..16), any::<bool>()),
                0..24,
            )
        ) {
            let frames: Vec<Frame> = spec.iter().map(|(b, _)| frame(b)).collect();
            let flags: Vec<DiscardFlag> = spec
                .iter()
                .map(|(_, keep)| if *keep { DiscardFlag::Keep } else { DiscardFlag::Discard })
                .collect();
            let expected: Vec<u8> = spec
                .iter()
                .filter(|(_, keep)| *keep)
                .flat_map(|(b, _)| b.iter().copied())
                .collect();
            let key = assemble_reconciled_key(&frames, &flags).unwrap();
            prop_assert_eq!(key.bits(), expected.as_slice());
        }
    }
}
