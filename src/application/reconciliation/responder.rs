use crate::application::errors::ReconciliationError;
use crate::application::run::{Rejection, Run, expect};
use crate::domain::{
    DiscardSummary, DomainError, ErrorReport, MdrDimension, ReconciledKey,
    ReconciliationDiscardFlags, ReconciliationInit, ReconciliationVerification, Role,
    SymbolSequence, assemble_reconciled_key,
};
use crate::ports::{
    ControlChannel, DecodeInput, DecodeOutput, ErrorCorrection, ProtocolEvent, ProtocolObserver,
    Stage,
};
use crate::protocol::{ControlCode, ControlMessage, Envelope};

use super::fsm_machine::ReconciliationFsm;
use super::fsm_types::ReconciliationEvent as E;

/// Alice: block for the initiator's first message, then run the round.
///
/// # Errors
/// See [`reconcile_responder_with`]; additionally a channel error while
/// waiting for the first message.
pub fn reconcile_responder<C: ControlChannel + ?Sized>(
    channel: &mut C,
    engine: &dyn ErrorCorrection,
    symbols: &SymbolSequence,
    dimension: MdrDimension,
    observer: &dyn ProtocolObserver,
) -> Result<ReconciledKey, ReconciliationError> {
    let first = channel.recv()?;
    reconcile_responder_with(channel, engine, symbols, dimension, first, observer)
}

/// Alice: run the round starting from an already received first message.
///
/// Every failure after the first message is reported to the initiator in-band
/// before returning (`INVALID_CONTENT`, `UNEXPECTED_COMMAND` or
/// `RECONCILIATION_ERROR`), except failures of the channel itself.
///
/// # Errors
/// * [`ReconciliationError::InvalidContent`] if a payload lacks a field.
/// * [`ReconciliationError::UnexpectedCommand`] for an out-of-sequence code.
/// * [`ReconciliationError::Engine`] if decoding produced no usable output.
/// * [`ReconciliationError::Assembly`] if the final flags do not match the frames.
/// * [`ReconciliationError::Channel`] on transport failure.
pub fn reconcile_responder_with<C: ControlChannel + ?Sized>(
    channel: &mut C,
    engine: &dyn ErrorCorrection,
    symbols: &SymbolSequence,
    dimension: MdrDimension,
    first: Envelope,
    observer: &dyn ProtocolObserver,
) -> Result<ReconciledKey, ReconciliationError> {
    let mut run = Run::new(Stage::Reconciliation, Role::Responder, channel, observer);
    let mut fsm = ReconciliationFsm::new(Role::Responder);
    match respond(&mut run, &mut fsm, engine, symbols, dimension, &first) {
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

fn respond<C: ControlChannel + ?Sized>(
    run: &mut Run<'_, C>,
    fsm: &mut ReconciliationFsm,
    engine: &dyn ErrorCorrection,
    symbols: &SymbolSequence,
    dimension: MdrDimension,
    first: &Envelope,
) -> Result<ReconciledKey, ReconciliationError> {
    fsm.advance(E::ResponderBegin, run.observer)?;
    run.check_real(symbols);
    run.received(first);

    let init = expect(first, ControlCode::ReconciliationInitialization, |m| match m {
        ControlMessage::ReconciliationInit(init) => Some(init),
        _ => None,
    })
    .map_err(|r| reject(run, r))?;

    let decoded = decode(run, engine, symbols, dimension, &init)?;
    fsm.advance(E::ResponderDecoded, run.observer)?;
    let DecodeOutput {
        checksums,
        discard_flags,
        decoded_frames,
    } = decoded;

    run.send(&ControlMessage::ReconciliationVerification(
        ReconciliationVerification {
            crc_alice: checksums,
            discard_flags,
        },
    ))?;
    fsm.advance(E::ResponderSentVerification, run.observer)?;

    let reply = run.recv()?;
    let ReconciliationDiscardFlags {
        final_discard_flags,
    } = expect(&reply, ControlCode::ReconciliationDiscardFlags, |m| match m {
        ControlMessage::ReconciliationDiscardFlags(flags) => Some(flags),
        _ => None,
    })
    .map_err(|r| reject(run, r))?;

    let summary = DiscardSummary::of(&final_discard_flags);
    run.emit(ProtocolEvent::Discards {
        kept: summary.kept,
        discarded: summary.discarded,
    });

    let key = assemble_reconciled_key(&decoded_frames, &final_discard_flags).map_err(|e| {
        if let DomainError::LengthMismatch { expected, actual, .. } = &e {
            run.notify(&ControlMessage::InvalidContent(Some(ErrorReport::new(format!(
                "final_discard_flags has {actual} entries for {expected} frames."
            )))));
        }
        ReconciliationError::Assembly(e)
    })?;

    run.send(&ControlMessage::ReconciliationFinished)?;
    fsm.advance(E::ResponderFinished, run.observer)?;
    Ok(key)
}

fn decode<C: ControlChannel + ?Sized>(
    run: &mut Run<'_, C>,
    engine: &dyn ErrorCorrection,
    symbols: &SymbolSequence,
    dimension: MdrDimension,
    init: &ReconciliationInit,
) -> Result<DecodeOutput, ReconciliationError> {
    run.emit(ProtocolEvent::EngineCall {
        operation: "decode_and_verify",
    });
    let input = DecodeInput {
        channel_message: &init.channel_message,
        syndrome: &init.syndrome,
        normalization_vector: &init.normalization_vector,
        signal_to_noise_ratio: init.signal_to_noise_ratio,
    };
    engine
        .decode_and_verify(symbols, input, dimension)
        .and_then(DecodeOutput::ensure_complete)
        .map_err(|e| {
            run.notify(&ControlMessage::ReconciliationError(Some(ErrorReport::new(
                format!("Error correction failed at Alice's side: {e}"),
            ))));
            ReconciliationError::Engine(e)
        })
}

fn reject<C: ControlChannel + ?Sized>(run: &mut Run<'_, C>, rejection: Rejection) -> ReconciliationError {
    run.notify(&rejection.reply());
    match rejection {
        Rejection::Unexpected { expected, got } => {
            ReconciliationError::UnexpectedCommand { expected, got }
        }
        Rejection::Invalid(e) => ReconciliationError::InvalidContent(e),
    }
}
