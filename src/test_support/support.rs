use crate::domain::{
    Beta, MdrDimension, ReconciledKey, ReconciliationDiscardFlags, ReconciliationInit,
    ReconciliationVerification, SecretKeyRatio, SignalToNoiseRatio, SymbolSequence,
};
use crate::ports::{DecodeOutput, EncodeOutput};
use crate::protocol::{ControlMessage, Envelope};

/// Deterministic pseudo-Gaussian-looking real symbols, never exactly zero.
pub fn mk_symbols(len: usize) -> SymbolSequence {
    let values = (0..len)
        .map(|i| {
            let x = ((i * 7919) % 1000) as f64 / 1000.0 - 0.4995;
            x * 3.0
        })
        .collect();
    SymbolSequence::from_real(values).unwrap()
}

/// Alternating-ish bit pattern of length `len`.
pub fn mk_bits(len: usize) -> Vec<u8> {
    (0..len).map(|i| u8::from(i % 3 == 1 || i % 5 == 0)).collect()
}

pub fn mk_key(len: usize) -> ReconciledKey {
    ReconciledKey::new(mk_bits(len)).unwrap()
}

pub fn mk_dimension() -> MdrDimension {
    MdrDimension::new(8).unwrap()
}

pub fn mk_beta() -> Beta {
    Beta::new(0.95).unwrap()
}

pub fn mk_snr() -> SignalToNoiseRatio {
    SignalToNoiseRatio::new(0.8).unwrap()
}

pub fn mk_ratio(r: f64) -> SecretKeyRatio {
    SecretKeyRatio::new(r).unwrap()
}

/// Envelope a typed message encodes to.
pub fn envelope(msg: &ControlMessage) -> Envelope {
    msg.to_envelope().unwrap()
}

/// The initiation message carrying `encoded` side information.
pub fn mk_init(encoded: &EncodeOutput) -> Envelope {
    envelope(&ControlMessage::ReconciliationInit(ReconciliationInit {
        channel_message: encoded.channel_message.clone(),
        syndrome: encoded.syndrome.clone(),
        normalization_vector: encoded.normalization_vector.clone(),
        signal_to_noise_ratio: mk_snr(),
    }))
}

/// The verification message a responder would send for `decoded`.
pub fn mk_verification(decoded: &DecodeOutput) -> Envelope {
    envelope(&ControlMessage::ReconciliationVerification(
        ReconciliationVerification {
            crc_alice: decoded.checksums.clone(),
            discard_flags: decoded.discard_flags.clone(),
        },
    ))
}

pub fn mk_discard_flags(flags: ReconciliationDiscardFlags) -> Envelope {
    envelope(&ControlMessage::ReconciliationDiscardFlags(flags))
}
