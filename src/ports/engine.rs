//! Error-correction engine boundary.
//!
//! The engine owns the coding mathematics; the protocol only moves its
//! outputs between the parties. Engines historically signalled failure by
//! returning empty collections, so every output type offers
//! `ensure_complete` which turns that convention into an explicit error.

use thiserror::Error;

use crate::domain::{
    Beta, ChannelMessage, DiscardFlag, DomainError, Frame, FrameChecksum, MdrDimension,
    NormalizationVector, SignalToNoiseRatio, SymbolSequence, Syndrome,
};

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine produced an empty collection where output was required.
    #[error("error correction produced no {0}")]
    EmptyOutput(&'static str),
    /// Inputs are inconsistent with each other (e.g. frame counts).
    #[error("error correction input rejected: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Responder-side decode result: one entry per frame in each collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutput {
    pub checksums: Vec<FrameChecksum>,
    pub discard_flags: Vec<DiscardFlag>,
    pub decoded_frames: Vec<Frame>,
}

impl DecodeOutput {
    /// # Errors
    /// [`EngineError::EmptyOutput`] naming the first empty collection.
    pub fn ensure_complete(self) -> Result<Self, EngineError> {
        if self.checksums.is_empty() {
            return Err(EngineError::EmptyOutput("checksums"));
        }
        if self.discard_flags.is_empty() {
            return Err(EngineError::EmptyOutput("discard flags"));
        }
        if self.decoded_frames.is_empty() {
            return Err(EngineError::EmptyOutput("decoded frames"));
        }
        Ok(self)
    }
}

/// Initiator-side encode result.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOutput {
    pub channel_message: ChannelMessage,
    pub syndrome: Syndrome,
    pub normalization_vector: NormalizationVector,
    /// Frame-wise candidate bits prior to agreement.
    pub raw_frames: Vec<Frame>,
}

impl EncodeOutput {
    /// # Errors
    /// [`EngineError::EmptyOutput`] naming the first empty collection.
    pub fn ensure_complete(self) -> Result<Self, EngineError> {
        if self.channel_message.is_empty() {
            return Err(EngineError::EmptyOutput("channel message"));
        }
        if self.syndrome.is_empty() {
            return Err(EngineError::EmptyOutput("syndrome"));
        }
        if self.normalization_vector.is_empty() {
            return Err(EngineError::EmptyOutput("normalization vector"));
        }
        if self.raw_frames.is_empty() {
            return Err(EngineError::EmptyOutput("raw key"));
        }
        Ok(self)
    }
}

/// Initiator-side checksum verification result.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutput {
    pub final_discard_flags: Vec<DiscardFlag>,
    /// Frames agreed on, already filtered by `final_discard_flags`.
    pub final_frames: Vec<Frame>,
}

impl MergeOutput {
    /// An all-discard verdict legitimately yields no frames, so only the
    /// flag vector is required to be non-empty.
    ///
    /// # Errors
    /// [`EngineError::EmptyOutput`] if no final discard flags were produced.
    pub fn ensure_complete(self) -> Result<Self, EngineError> {
        if self.final_discard_flags.is_empty() {
            return Err(EngineError::EmptyOutput("final discard flags"));
        }
        Ok(self)
    }
}

/// Side information the responder received from the initiator.
#[derive(Debug, Clone, Copy)]
pub struct DecodeInput<'a> {
    pub channel_message: &'a ChannelMessage,
    pub syndrome: &'a Syndrome,
    pub normalization_vector: &'a NormalizationVector,
    pub signal_to_noise_ratio: SignalToNoiseRatio,
}

/// Stateless forward-error-correction engine used by both roles.
pub trait ErrorCorrection {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Responder: decode the local symbols against the initiator's side
    /// information and report, per frame, a checksum, a discard flag and
    /// the decoded bits.
    ///
    /// # Errors
    /// [`EngineError`] if the inputs cannot be decoded at all.
    fn decode_and_verify(
        &self,
        symbols: &SymbolSequence,
        input: DecodeInput<'_>,
        dimension: MdrDimension,
    ) -> Result<DecodeOutput, EngineError>;

    /// Initiator: derive side information and the raw key frames.
    ///
    /// # Errors
    /// [`EngineError`] if the symbols cannot be encoded.
    fn encode(
        &self,
        symbols: &SymbolSequence,
        beta: Beta,
        snr: SignalToNoiseRatio,
        dimension: MdrDimension,
    ) -> Result<EncodeOutput, EngineError>;

    /// Initiator: compare local frames with the responder's checksums and
    /// flags, returning the merged verdict and the surviving frames.
    ///
    /// # Errors
    /// [`EngineError::InvalidInput`] if the collections are misaligned.
    fn verify_and_merge(
        &self,
        raw_frames: &[Frame],
        peer_checksums: &[FrameChecksum],
        peer_discard_flags: &[DiscardFlag],
    ) -> Result<MergeOutput, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(bits: &[u8]) -> Frame {
        Frame::new(bits.to_vec()).unwrap()
    }

    #[test]
    fn decode_output_names_first_empty_collection() {
        let out = DecodeOutput {
            checksums: vec![FrameChecksum(1)],
            discard_flags: vec![],
            decoded_frames: vec![frame(&[1])],
        };
        let err = out.ensure_complete().unwrap_err();
        assert_eq!(err.to_string(), "error correction produced no discard flags");
    }

    #[test]
    fn encode_output_requires_raw_key() {
        let out = EncodeOutput {
            channel_message: ChannelMessage(vec![1.0]),
            syndrome: Syndrome(vec![vec![0]]),
            normalization_vector: NormalizationVector(vec![1.0]),
            raw_frames: vec![],
        };
        assert!(matches!(out.ensure_complete(), Err(EngineError::EmptyOutput("raw key"))));
    }

    #[test]
    fn merge_output_allows_all_discarded() {
        let out = MergeOutput {
            final_discard_flags: vec![DiscardFlag::Discard],
            final_frames: vec![],
        };
        assert!(out.ensure_complete().is_ok());
        let empty = MergeOutput {
            final_discard_flags: vec![],
            final_frames: vec![],
        };
        assert!(empty.ensure_complete().is_err());
    }
}
