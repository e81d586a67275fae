use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand_core::{CryptoRng, RngCore};

use crate::domain::{
    Beta, ChannelMessage, DiscardFlag, FinalKey, Frame, FrameChecksum, MdrDimension,
    NormalizationVector, ReconciledKey, Seed, SignalToNoiseRatio, SymbolSequence, Syndrome,
};
use crate::ports::{
    ChannelPortError, ControlChannel, DecodeInput, DecodeOutput, EncodeOutput, EngineError,
    ErrorCorrection, Extractor, ExtractorError, MergeOutput, ProtocolEvent, ProtocolObserver,
};
use crate::protocol::{ControlCode, Envelope};

/// Predictable byte stream (0, 1, 2, ...) marked as a CSPRNG for tests only.
#[derive(Debug, Default, Clone)]
pub struct CountingRng(u8);

impl RngCore for CountingRng {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for b in dest {
            *b = self.0;
            self.0 = self.0.wrapping_add(1);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for CountingRng {}

/// Channel that replays scripted replies and records what was sent.
///
/// `recv` on an exhausted script reports the peer as closed.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    replies: VecDeque<Envelope>,
    pub sent: Vec<Envelope>,
}

impl ScriptedChannel {
    pub fn new(replies: impl IntoIterator<Item = Envelope>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            sent: Vec::new(),
        }
    }

    pub fn sent_codes(&self) -> Vec<ControlCode> {
        self.sent.iter().map(|e| e.code).collect()
    }

    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}

impl ControlChannel for ScriptedChannel {
    fn send(&mut self, envelope: Envelope) -> Result<(), ChannelPortError> {
        self.sent.push(envelope);
        Ok(())
    }

    fn recv(&mut self) -> Result<Envelope, ChannelPortError> {
        self.replies.pop_front().ok_or(ChannelPortError::Closed)
    }
}

/// Error-correction double returning canned outputs and counting calls.
///
/// A `None` output makes the corresponding operation fail.
#[derive(Debug, Default)]
pub struct MockEngine {
    pub decode: Option<DecodeOutput>,
    pub encode: Option<EncodeOutput>,
    pub merge: Option<MergeOutput>,
    decode_calls: AtomicUsize,
    encode_calls: AtomicUsize,
    merge_calls: AtomicUsize,
}

impl MockEngine {
    /// Outputs of a run in which both sides agree on `frames` and nothing is
    /// discarded.
    pub fn agreeing(frames: &[Vec<u8>]) -> Self {
        let frames: Vec<Frame> = frames
            .iter()
            .map(|bits| Frame::new(bits.clone()).unwrap())
            .collect();
        let n = frames.len();
        let checksums: Vec<FrameChecksum> =
            (0..n).map(|i| FrameChecksum(u32::try_from(i).unwrap())).collect();
        Self {
            decode: Some(DecodeOutput {
                checksums,
                discard_flags: vec![DiscardFlag::Keep; n],
                decoded_frames: frames.clone(),
            }),
            encode: Some(EncodeOutput {
                channel_message: ChannelMessage(vec![0.5; n]),
                syndrome: Syndrome(vec![vec![0, 1]; n]),
                normalization_vector: NormalizationVector(vec![1.0; n]),
                raw_frames: frames.clone(),
            }),
            merge: Some(MergeOutput {
                final_discard_flags: vec![DiscardFlag::Keep; n],
                final_frames: frames,
            }),
            ..Self::default()
        }
    }

    pub fn decode_calls(&self) -> usize {
        self.decode_calls.load(Ordering::SeqCst)
    }

    pub fn encode_calls(&self) -> usize {
        self.encode_calls.load(Ordering::SeqCst)
    }

    pub fn merge_calls(&self) -> usize {
        self.merge_calls.load(Ordering::SeqCst)
    }
}

fn scripted<T: Clone>(out: Option<&T>, what: &str) -> Result<T, EngineError> {
    out.cloned()
        .ok_or_else(|| EngineError::InvalidInput(format!("scripted {what} failure")))
}

impl ErrorCorrection for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn decode_and_verify(
        &self,
        _symbols: &SymbolSequence,
        _input: DecodeInput<'_>,
        _dimension: MdrDimension,
    ) -> Result<DecodeOutput, EngineError> {
        self.decode_calls.fetch_add(1, Ordering::SeqCst);
        scripted(self.decode.as_ref(), "decode")
    }

    fn encode(
        &self,
        _symbols: &SymbolSequence,
        _beta: Beta,
        _snr: SignalToNoiseRatio,
        _dimension: MdrDimension,
    ) -> Result<EncodeOutput, EngineError> {
        self.encode_calls.fetch_add(1, Ordering::SeqCst);
        scripted(self.encode.as_ref(), "encode")
    }

    fn verify_and_merge(
        &self,
        _raw_frames: &[Frame],
        _peer_checksums: &[FrameChecksum],
        _peer_discard_flags: &[DiscardFlag],
    ) -> Result<MergeOutput, EngineError> {
        self.merge_calls.fetch_add(1, Ordering::SeqCst);
        scripted(self.merge.as_ref(), "merge")
    }
}

/// Deterministic extractor: output bit `i` is `input[i] ^ seed[i]`, so the
/// seed is exactly `output_len` bits.
#[derive(Debug, Default)]
pub struct MaskingExtractor {
    calls: AtomicUsize,
}

impl MaskingExtractor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Extractor for MaskingExtractor {
    fn name(&self) -> &'static str {
        "masking"
    }

    fn required_seed_length(&self, input_len: usize, output_len: usize) -> Result<usize, ExtractorError> {
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
        Ok(output_len)
    }

    fn extract(
        &self,
        input: &ReconciledKey,
        output_len: usize,
        seed: &Seed,
    ) -> Result<FinalKey, ExtractorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let expected = self.required_seed_length(input.len(), output_len)?;
        if seed.len() != expected {
            return Err(ExtractorError::SeedLength {
                expected,
                actual: seed.len(),
            });
        }
        let bits = input
            .bits()
            .iter()
            .zip(seed.bits())
            .map(|(a, b)| a ^ b)
            .collect();
        Ok(FinalKey::new(bits).unwrap())
    }
}

/// Observer that keeps every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ProtocolEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ProtocolEvent> {
        self.events.lock().unwrap().clone()
    }

    /// `(from, to)` pairs of every recorded transition.
    pub fn transitions(&self) -> Vec<(&'static str, &'static str)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProtocolEvent::Transition { from, to, .. } => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    pub fn aborted(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ProtocolEvent::Aborted { .. }))
    }
}

impl ProtocolObserver for RecordingObserver {
    fn on_event(&self, event: &ProtocolEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
