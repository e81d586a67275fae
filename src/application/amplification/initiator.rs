use rand_core::CryptoRngCore;

use crate::application::errors::AmplificationError;
use crate::application::run::{Run, peer_error};
use crate::domain::{AmplificationRequest, FinalKey, ReconciledKey, Role, SecretKeyRatio};
use crate::ports::{ControlChannel, Extractor, ProtocolEvent, ProtocolObserver, Stage};
use crate::protocol::{ControlCode, ControlMessage};

/// Bob: extract locally with a fresh seed, send `{seed, secret_key_ratio}`
/// and keep the final key only if the responder confirms with
/// `AMPLIFICATION_SUCCESS`.
///
/// A locally computed key that the peer does not confirm is dropped (and
/// zeroized) before returning.
///
/// # Errors
/// * [`AmplificationError::Extractor`] if extraction fails; the peer is not contacted.
/// * [`AmplificationError::NotConfirmed`] for any outcome other than success.
/// * [`AmplificationError::Channel`] on transport failure.
pub fn amplify_initiator<C: ControlChannel + ?Sized>(
    channel: &mut C,
    extractor: &dyn Extractor,
    reconciled: &ReconciledKey,
    ratio: SecretKeyRatio,
    rng: &mut dyn CryptoRngCore,
    observer: &dyn ProtocolObserver,
) -> Result<FinalKey, AmplificationError> {
    let mut run = Run::new(Stage::Amplification, Role::Initiator, channel, observer);
    match amplify(&mut run, extractor, reconciled, ratio, rng) {
        Ok(key) => {
            run.emit(ProtocolEvent::Completed {
                stage: Stage::Amplification,
                key_len: key.len(),
            });
            Ok(key)
        }
        Err(e) => Err(run.abort(e)),
    }
}

fn amplify<C: ControlChannel + ?Sized>(
    run: &mut Run<'_, C>,
    extractor: &dyn Extractor,
    reconciled: &ReconciledKey,
    ratio: SecretKeyRatio,
    rng: &mut dyn CryptoRngCore,
) -> Result<FinalKey, AmplificationError> {
    let output_len = ratio.final_key_len(reconciled.len());
    run.emit(ProtocolEvent::ExtractorCall {
        extractor: extractor.name(),
        input_len: reconciled.len(),
        output_len,
    });
    let (key, seed) = extractor.extract_with_fresh_seed(reconciled, output_len, rng)?;

    let reply = run.request(&ControlMessage::AmplificationRequest(AmplificationRequest {
        seed,
        secret_key_ratio: ratio,
    }))?;

    if reply.code == ControlCode::AmplificationSuccess {
        return Ok(key);
    }
    let message = peer_error(&reply).flatten();
    drop(key);
    Err(AmplificationError::NotConfirmed {
        code: reply.code,
        message,
    })
}
