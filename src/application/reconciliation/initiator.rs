use crate::application::errors::ReconciliationError;
use crate::application::run::{Rejection, Run, expect, peer_error};
use crate::domain::{
    Beta, DiscardSummary, MdrDimension, ReconciledKey, ReconciliationDiscardFlags,
    ReconciliationInit, ReconciliationVerification, Role, SignalToNoiseRatio, SymbolSequence,
    flatten_frames,
};
use crate::ports::{
    ControlChannel, EncodeOutput, ErrorCorrection, MergeOutput, ProtocolEvent, ProtocolObserver,
    Stage,
};
use crate::protocol::{ControlCode, ControlMessage, Envelope};

use super::fsm_machine::ReconciliationFsm;
use super::fsm_types::ReconciliationEvent as E;

/// Bob's local reconciliation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitiatorParams {
    pub beta: Beta,
    pub signal_to_noise_ratio: SignalToNoiseRatio,
    pub mdr_dimension: MdrDimension,
}

/// Bob: encode locally, exchange side information and checksums with the
/// responder, and return the merged reconciled key.
///
/// The initiator never sends failure outcomes: a local encode failure aborts
/// before the peer is contacted, and a bad reply simply ends the round.
///
/// # Errors
/// * [`ReconciliationError::Engine`] if encoding or merging produced no output.
/// * [`ReconciliationError::PeerAborted`] if the responder answered with a failure outcome.
/// * [`ReconciliationError::UnexpectedCommand`] / [`ReconciliationError::InvalidContent`]
///   for any other unusable reply.
/// * [`ReconciliationError::Channel`] on transport failure.
pub fn reconcile_initiator<C: ControlChannel + ?Sized>(
    channel: &mut C,
    engine: &dyn ErrorCorrection,
    symbols: &SymbolSequence,
    params: InitiatorParams,
    observer: &dyn ProtocolObserver,
) -> Result<ReconciledKey, ReconciliationError> {
    let mut run = Run::new(Stage::Reconciliation, Role::Initiator, channel, observer);
    let mut fsm = ReconciliationFsm::new(Role::Initiator);
    match initiate(&mut run, &mut fsm, engine, symbols, params) {
        Ok(key) => {
            run.emit(ProtocolEvent::Completed {
                stage: Stage::Reconciliation,
                key_len: key.len(),
            });
            Ok(key)
        }
        Err(e) => {
            fsm.abort(observer);
            Err(run.abort(e))
        }
    }
}

fn initiate<C: ControlChannel + ?Sized>(
    run: &mut Run<'_, C>,
    fsm: &mut ReconciliationFsm,
    engine: &dyn ErrorCorrection,
    symbols: &SymbolSequence,
    params: InitiatorParams,
) -> Result<ReconciledKey, ReconciliationError> {
    run.check_real(symbols);

    run.emit(ProtocolEvent::EngineCall {
        operation: "encode",
    });
    let EncodeOutput {
        channel_message,
        syndrome,
        normalization_vector,
        raw_frames,
    } = engine
        .encode(
            symbols,
            params.beta,
            params.signal_to_noise_ratio,
            params.mdr_dimension,
        )
        .and_then(EncodeOutput::ensure_complete)?;
    fsm.advance(E::InitiatorEncoded, run.observer)?;

    run.send(&ControlMessage::ReconciliationInit(ReconciliationInit {
        channel_message,
        syndrome,
        normalization_vector,
        signal_to_noise_ratio: params.signal_to_noise_ratio,
    }))?;
    fsm.advance(E::InitiatorSentInit, run.observer)?;

    let reply = run.recv()?;
    let ReconciliationVerification {
        crc_alice,
        discard_flags,
    } = accept(&reply, ControlCode::ReconciliationVerification, |m| match m {
        ControlMessage::ReconciliationVerification(v) => Some(v),
        _ => None,
    })?;

    run.emit(ProtocolEvent::EngineCall {
        operation: "verify_and_merge",
    });
    let MergeOutput {
        final_discard_flags,
        final_frames,
    } = engine
        .verify_and_merge(&raw_frames, &crc_alice, &discard_flags)
        .and_then(MergeOutput::ensure_complete)?;
    fsm.advance(E::InitiatorMerged, run.observer)?;

    let summary = DiscardSummary::of(&final_discard_flags);
    run.emit(ProtocolEvent::Discards {
        kept: summary.kept,
        discarded: summary.discarded,
    });

    let ack = run.request(&ControlMessage::ReconciliationDiscardFlags(
        ReconciliationDiscardFlags {
            final_discard_flags,
        },
    ))?;
    accept(&ack, ControlCode::ReconciliationFinished, |m| match m {
        ControlMessage::ReconciliationFinished => Some(()),
        _ => None,
    })?;
    fsm.advance(E::InitiatorAcknowledged, run.observer)?;

    Ok(flatten_frames(&final_frames))
}

/// Like `expect`, but a failure outcome from the peer is reported as such.
fn accept<T>(
    envelope: &Envelope,
    expected: ControlCode,
    pick: impl FnOnce(ControlMessage) -> Option<T>,
) -> Result<T, ReconciliationError> {
    if let Some(message) = peer_error(envelope) {
        return Err(ReconciliationError::PeerAborted {
            code: envelope.code,
            message,
        });
    }
    expect(envelope, expected, pick).map_err(|r| match r {
        Rejection::Unexpected { expected, got } => {
            ReconciliationError::UnexpectedCommand { expected, got }
        }
        Rejection::Invalid(e) => ReconciliationError::InvalidContent(e),
    })
}
