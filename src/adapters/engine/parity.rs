// src/adapters/engine/parity.rs
use sha2::{Digest, Sha256};

use crate::domain::{
    Beta, ChannelMessage, DiscardFlag, Frame, FrameChecksum, MdrDimension, NormalizationVector,
    SignalToNoiseRatio, SymbolSequence, Syndrome,
};
use crate::ports::{
    DecodeInput, DecodeOutput, EncodeOutput, EngineError, ErrorCorrection, MergeOutput,
};

/// Symbols per frame per reconciliation dimension unless configured.
pub const DEFAULT_SYMBOLS_PER_DIMENSION: usize = 16;

/// Reference hard-decision engine: one parity check per frame.
///
/// This is a test and interoperability engine, not a capacity-approaching
/// code. Per frame of `dimension * symbols_per_dimension` symbols:
///
/// * bits are sign decisions (`1` for a negative symbol);
/// * the syndrome is the single parity bit of the initiator's frame;
/// * the normalization value is the initiator's frame RMS;
/// * the channel message is the discard threshold `beta * mean|y| / rms(y)`.
///
/// The responder flips its least reliable bit when parities disagree and
/// discards the frame if even that bit was more reliable than the threshold.
/// A trailing partial frame is its own frame.
#[derive(Debug, Clone, Copy)]
pub struct ParityCheckEngine {
    symbols_per_dimension: usize,
}

impl Default for ParityCheckEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOLS_PER_DIMENSION)
    }
}

impl ParityCheckEngine {
    /// `symbols_per_dimension` of zero is treated as one.
    #[must_use]
    pub fn new(symbols_per_dimension: usize) -> Self {
        Self {
            symbols_per_dimension: symbols_per_dimension.max(1),
        }
    }

    fn frame_len(&self, dimension: MdrDimension) -> usize {
        dimension.as_usize() * self.symbols_per_dimension
    }
}

/// Truncated SHA-256 of the frame bits, big-endian.
#[must_use]
pub fn frame_checksum(bits: &[u8]) -> FrameChecksum {
    let digest = Sha256::digest(bits);
    FrameChecksum(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

fn sign_bits(values: &[f64]) -> Vec<u8> {
    values.iter().map(|v| u8::from(*v < 0.0)).collect()
}

fn parity(bits: &[u8]) -> u8 {
    bits.iter().fold(0, |acc, b| acc ^ b)
}

#[allow(clippy::cast_precision_loss)]
fn rms(values: &[f64]) -> f64 {
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

#[allow(clippy::cast_precision_loss)]
fn mean_abs(values: &[f64]) -> f64 {
    values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
}

impl ErrorCorrection for ParityCheckEngine {
    fn name(&self) -> &'static str {
        "parity-check"
    }

    fn decode_and_verify(
        &self,
        symbols: &SymbolSequence,
        input: DecodeInput<'_>,
        dimension: MdrDimension,
    ) -> Result<DecodeOutput, EngineError> {
        let values = symbols.real_parts();
        let frames: Vec<&[f64]> = values.chunks(self.frame_len(dimension)).collect();
        let n = frames.len();
        let DecodeInput {
            channel_message: ChannelMessage(thresholds),
            syndrome: Syndrome(syndrome),
            normalization_vector: NormalizationVector(norms),
            signal_to_noise_ratio,
        } = input;
        if syndrome.len() != n || norms.len() != n || thresholds.len() != n {
            return Err(EngineError::InvalidInput(format!(
                "{n} frames but {} syndromes, {} normalization values, {} channel message values",
                syndrome.len(),
                norms.len(),
                thresholds.len()
            )));
        }
        tracing::debug!(frames = n, snr = signal_to_noise_ratio.get(), "parity-check decode");

        let mut checksums = Vec::with_capacity(n);
        let mut discard_flags = Vec::with_capacity(n);
        let mut decoded_frames = Vec::with_capacity(n);
        for (f, frame) in frames.iter().enumerate() {
            let expected = match syndrome[f].as_slice() {
                [p @ (0 | 1)] => *p,
                _ => {
                    return Err(EngineError::InvalidInput(format!(
                        "syndrome {f} is not a single parity bit"
                    )));
                }
            };
            let mut bits = sign_bits(frame);
            let mut flag = DiscardFlag::Keep;
            if parity(&bits) != expected {
                let scale = if norms[f] > 0.0 { norms[f] } else { 1.0 };
                let (weakest, reliability) = frame
                    .iter()
                    .map(|v| v.abs() / scale)
                    .enumerate()
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .unwrap_or((0, f64::INFINITY));
                bits[weakest] ^= 1;
                if reliability > thresholds[f] {
                    flag = DiscardFlag::Discard;
                }
            }
            checksums.push(frame_checksum(&bits));
            discard_flags.push(flag);
            decoded_frames.push(Frame::new(bits)?);
        }
        Ok(DecodeOutput {
            checksums,
            discard_flags,
            decoded_frames,
        })
    }

    fn encode(
        &self,
        symbols: &SymbolSequence,
        beta: Beta,
        snr: SignalToNoiseRatio,
        dimension: MdrDimension,
    ) -> Result<EncodeOutput, EngineError> {
        let values = symbols.real_parts();
        let frame_len = self.frame_len(dimension);
        tracing::debug!(
            symbols = values.len(),
            frame_len,
            snr = snr.get(),
            "parity-check encode"
        );
        let mut thresholds = Vec::new();
        let mut syndrome = Vec::new();
        let mut norms = Vec::new();
        let mut raw_frames = Vec::new();
        for frame in values.chunks(frame_len) {
            let bits = sign_bits(frame);
            let norm = rms(frame);
            let spread = if norm > 0.0 { mean_abs(frame) / norm } else { 0.0 };
            thresholds.push(beta.get() * spread);
            syndrome.push(vec![parity(&bits)]);
            norms.push(norm);
            raw_frames.push(Frame::new(bits)?);
        }
        Ok(EncodeOutput {
            channel_message: ChannelMessage(thresholds),
            syndrome: Syndrome(syndrome),
            normalization_vector: NormalizationVector(norms),
            raw_frames,
        })
    }

    fn verify_and_merge(
        &self,
        raw_frames: &[Frame],
        peer_checksums: &[FrameChecksum],
        peer_discard_flags: &[DiscardFlag],
    ) -> Result<MergeOutput, EngineError> {
        if peer_checksums.len() != raw_frames.len() || peer_discard_flags.len() != raw_frames.len() {
            return Err(EngineError::InvalidInput(format!(
                "{} frames but {} checksums and {} discard flags",
                raw_frames.len(),
                peer_checksums.len(),
                peer_discard_flags.len()
            )));
        }
        let mut final_discard_flags = Vec::with_capacity(raw_frames.len());
        let mut final_frames = Vec::new();
        for ((frame, crc), peer_flag) in raw_frames.iter().zip(peer_checksums).zip(peer_discard_flags) {
            let local = if frame_checksum(frame.bits()) == *crc {
                DiscardFlag::Keep
            } else {
                DiscardFlag::Discard
            };
            let merged = peer_flag.merge(local);
            if merged.is_keep() {
                final_frames.push(frame.clone());
            }
            final_discard_flags.push(merged);
        }
        Ok(MergeOutput {
            final_discard_flags,
            final_frames,
        })
    }
}
