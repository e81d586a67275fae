use crate::application::errors::AmplificationError;
use crate::application::run::{Rejection, Run, expect};
use crate::domain::{AmplificationRequest, ErrorReport, FinalKey, ReconciledKey, Role};
use crate::ports::{ControlChannel, Extractor, ProtocolEvent, ProtocolObserver, Stage};
use crate::protocol::{ControlCode, ControlMessage, Envelope};

/// Alice: block for the amplification request, then answer it.
///
/// # Errors
/// See [`amplify_responder_with`].
pub fn amplify_responder<C: ControlChannel + ?Sized>(
    channel: &mut C,
    extractor: &dyn Extractor,
    reconciled: &ReconciledKey,
    observer: &dyn ProtocolObserver,
) -> Result<FinalKey, AmplificationError> {
    let first = channel.recv()?;
    amplify_responder_with(channel, extractor, reconciled, first, observer)
}

/// Alice: apply the initiator's seed and ratio to the reconciled key.
///
/// Sends `AMPLIFICATION_SUCCESS` and returns the key when extraction succeeds,
/// otherwise sends `AMPLIFICATION_ERROR`. A request without `seed` or
/// `secret_key_ratio` is answered with `INVALID_CONTENT` and the extractor is
/// never called.
///
/// # Errors
/// * [`AmplificationError::InvalidContent`] / [`AmplificationError::UnexpectedCommand`]
///   for an unusable request.
/// * [`AmplificationError::Extractor`] if extraction fails (including a seed
///   whose length does not match what the extractor requires).
/// * [`AmplificationError::Channel`] on transport failure.
pub fn amplify_responder_with<C: ControlChannel + ?Sized>(
    channel: &mut C,
    extractor: &dyn Extractor,
    reconciled: &ReconciledKey,
    first: Envelope,
    observer: &dyn ProtocolObserver,
) -> Result<FinalKey, AmplificationError> {
    let mut run = Run::new(Stage::Amplification, Role::Responder, channel, observer);
    match respond(&mut run, extractor, reconciled, &first) {
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

fn respond<C: ControlChannel + ?Sized>(
    run: &mut Run<'_, C>,
    extractor: &dyn Extractor,
    reconciled: &ReconciledKey,
    first: &Envelope,
) -> Result<FinalKey, AmplificationError> {
    run.received(first);
    let AmplificationRequest {
        seed,
        secret_key_ratio,
    } = expect(first, ControlCode::AmplificationRequest, |m| match m {
        ControlMessage::AmplificationRequest(r) => Some(r),
        _ => None,
    })
    .map_err(|r| {
        run.notify(&r.reply());
        match r {
            Rejection::Unexpected { expected, got } => {
                AmplificationError::UnexpectedCommand { expected, got }
            }
            Rejection::Invalid(e) => AmplificationError::InvalidContent(e),
        }
    })?;

    let output_len = secret_key_ratio.final_key_len(reconciled.len());
    run.emit(ProtocolEvent::ExtractorCall {
        extractor: extractor.name(),
        input_len: reconciled.len(),
        output_len,
    });
    match extractor.extract(reconciled, output_len, &seed) {
        Ok(key) => {
            run.send(&ControlMessage::AmplificationSuccess)?;
            Ok(key)
        }
        Err(e) => {
            run.notify(&ControlMessage::AmplificationError(Some(ErrorReport::new(
                format!("An error happened during extraction: {e}"),
            ))));
            Err(AmplificationError::Extractor(e))
        }
    }
}
