//! Both parties running complete sessions against each other in-process.

use std::thread;

use cvqkd_pp::adapters::{MemoryChannel, ParityCheckEngine, ToeplitzExtractor};
use cvqkd_pp::application::{AliceSession, BobSession, Session, SessionError};
use cvqkd_pp::config::{ConfigError, ServiceConfig};
use cvqkd_pp::domain::{Beta, MdrDimension, SecretKeyRatio, SignalToNoiseRatio, SymbolSequence};
use cvqkd_pp::ports::{AliceRequest, BobRequest, KeyReply};
use cvqkd_pp::test_support::{CountingRng, RecordingObserver};

fn bob_values(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            (t * 0.731).sin() * 1.5 + (t * 0.117).cos() * 0.5
        })
        .collect()
}

const FRAME: usize = 8 * 16;

fn strongest(frame: &[f64], skip: usize) -> usize {
    let mut idx: Vec<usize> = (0..frame.len()).collect();
    idx.sort_by(|a, b| frame[*b].abs().total_cmp(&frame[*a].abs()));
    idx[skip]
}

/// Alice's view with sign errors planted in three frames:
/// frame 1 loses its weakest symbol (correctable), frame 3 two strong ones
/// (parity blind), frame 5 one strong one (wrong bit flipped).
fn noisy(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    let weakest = {
        let f = &values[FRAME..2 * FRAME];
        let (i, _) = f
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .unwrap();
        FRAME + i
    };
    out[weakest] = -values[weakest] * 0.5;
    for skip in [0, 1] {
        let i = 3 * FRAME + strongest(&values[3 * FRAME..4 * FRAME], skip);
        out[i] = -values[i];
    }
    let i = 5 * FRAME + strongest(&values[5 * FRAME..6 * FRAME], 0);
    out[i] = -values[i];
    out
}

fn alice(values: Vec<f64>, pa: bool) -> AliceRequest {
    AliceRequest {
        alice_symbols: SymbolSequence::from_real(values).unwrap(),
        mdr_dimension: MdrDimension::new(8).unwrap(),
        privacy_amplification: pa,
    }
}

fn bob(values: Vec<f64>, ratio: Option<f64>) -> BobRequest {
    BobRequest {
        bob_symbols: SymbolSequence::from_real(values).unwrap(),
        beta: Beta::new(0.95).unwrap(),
        signal_to_noise_ratio: SignalToNoiseRatio::new(1.2).unwrap(),
        mdr_dimension: MdrDimension::new(8).unwrap(),
        secret_key_ratio: ratio.map(|r| SecretKeyRatio::new(r).unwrap()),
    }
}

fn run_pair(
    a: AliceRequest,
    b: BobRequest,
) -> (Result<KeyReply, SessionError>, Result<KeyReply, SessionError>) {
    let (mut alice_ch, mut bob_ch) = MemoryChannel::pair();
    let alice = thread::spawn(move || {
        let mut session = AliceSession::new(
            Box::new(ParityCheckEngine::default()),
            Box::new(ToeplitzExtractor),
        );
        session.run(&mut alice_ch, a, &RecordingObserver::default())
    });
    let mut session = BobSession::with_rng(
        Box::new(ParityCheckEngine::default()),
        Box::new(ToeplitzExtractor),
        CountingRng::default(),
    );
    let bob_result = session.run(&mut bob_ch, b, &RecordingObserver::default());
    drop(bob_ch);
    (alice.join().unwrap(), bob_result)
}

fn bits(reply: &KeyReply) -> Vec<u8> {
    match reply {
        KeyReply::Final(k) => k.bits().to_vec(),
        KeyReply::Reconciled(k) => k.bits().to_vec(),
        KeyReply::Failure(e) => panic!("failure reply: {e}"),
    }
}

#[test]
fn noiseless_run_keeps_every_frame_and_halves_the_key() {
    let values = bob_values(1024);
    let (a, b) = run_pair(alice(values.clone(), true), bob(values, Some(0.5)));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(matches!(a, KeyReply::Final(_)));
    assert_eq!(bits(&a), bits(&b));
    assert_eq!(bits(&a).len(), 512);
}

#[test]
fn noisy_run_agrees_on_the_surviving_frames() {
    let values = bob_values(2048);
    let (a, b) = run_pair(alice(noisy(&values), false), bob(values, None));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(bits(&a), bits(&b));
    // Frames 3 and 5 are discarded; frame 1 is corrected.
    assert_eq!(bits(&a).len(), 2048 - 2 * FRAME);
}

#[test]
fn reconciliation_only_when_amplification_not_requested() {
    let values = bob_values(256);
    let (a, b) = run_pair(alice(values.clone(), false), bob(values, None));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(matches!(a, KeyReply::Reconciled(_)));
    assert!(matches!(b, KeyReply::Reconciled(_)));
    assert_eq!(bits(&a).len(), 256);
    assert_eq!(bits(&a), bits(&b));
}

#[test]
fn alice_expecting_amplification_fails_when_bob_skips_it() {
    let values = bob_values(256);
    let (a, b) = run_pair(alice(values.clone(), true), bob(values, None));
    assert!(b.is_ok());
    assert!(matches!(a, Err(SessionError::PeerSkippedAmplification)));
}

#[test]
fn mismatched_dimensions_leave_both_without_a_key() {
    let values = bob_values(256);
    let mut a = alice(values.clone(), true);
    a.mdr_dimension = MdrDimension::new(2).unwrap();
    let (a, b) = run_pair(a, bob(values, Some(0.5)));
    assert!(a.is_err());
    assert!(b.is_err());
}

#[test]
fn service_without_engine_refuses_to_start() {
    let config = ServiceConfig::from_toml_str("[amplification]\nextractor = \"toeplitz\"\n").unwrap();
    assert!(matches!(config.build_engine(), Err(ConfigError::MissingEngine)));
}
