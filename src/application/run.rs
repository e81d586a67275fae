use crate::domain::{Role, SymbolSequence};
use crate::ports::{ChannelPortError, ControlChannel, ProtocolEvent, ProtocolObserver, Stage};
use crate::protocol::{ControlCode, ControlMessage, Envelope, MessageError};

/// Channel access plus event reporting for one protocol run.
///
/// Every envelope that crosses the channel is reported to the observer, so
/// the protocol functions stay free of logging calls.
pub(crate) struct Run<'a, C: ControlChannel + ?Sized> {
    pub(crate) stage: Stage,
    pub(crate) role: Role,
    pub(crate) channel: &'a mut C,
    pub(crate) observer: &'a dyn ProtocolObserver,
}

impl<'a, C: ControlChannel + ?Sized> Run<'a, C> {
    pub(crate) fn new(
        stage: Stage,
        role: Role,
        channel: &'a mut C,
        observer: &'a dyn ProtocolObserver,
    ) -> Self {
        observer.on_event(&ProtocolEvent::Started { stage, role });
        Self {
            stage,
            role,
            channel,
            observer,
        }
    }

    pub(crate) fn emit(&self, event: ProtocolEvent) {
        self.observer.on_event(&event);
    }

    pub(crate) fn check_real(&self, symbols: &SymbolSequence) {
        if symbols.has_imaginary_part() {
            self.emit(ProtocolEvent::ImaginarySymbols { role: self.role });
        }
    }

    pub(crate) fn send(&mut self, message: &ControlMessage) -> Result<(), ChannelPortError> {
        self.channel.send_message(message)?;
        self.emit(ProtocolEvent::Sent {
            code: message.code(),
        });
        Ok(())
    }

    pub(crate) fn recv(&mut self) -> Result<Envelope, ChannelPortError> {
        let envelope = self.channel.recv()?;
        self.received(&envelope);
        Ok(envelope)
    }

    pub(crate) fn request(&mut self, message: &ControlMessage) -> Result<Envelope, ChannelPortError> {
        self.send(message)?;
        self.recv()
    }

    /// Report an envelope obtained outside this run (the first message).
    pub(crate) fn received(&self, envelope: &Envelope) {
        self.emit(ProtocolEvent::Received {
            code: envelope.code,
        });
    }

    /// Best-effort in-band failure notice; the local error wins regardless.
    pub(crate) fn notify(&mut self, message: &ControlMessage) {
        if let Err(e) = self.send(message) {
            tracing::warn!(
                stage = self.stage.as_str(),
                code = %message.code(),
                error = %e,
                "could not notify peer of abort"
            );
        }
    }

    /// Record an abort and hand the error back for `return Err(..)`.
    pub(crate) fn abort<E: std::fmt::Display>(&self, err: E) -> E {
        self.emit(ProtocolEvent::Aborted {
            stage: self.stage,
            reason: err.to_string(),
        });
        err
    }
}

/// Why a received envelope was not the message a step waits for.
#[derive(Debug)]
pub(crate) enum Rejection {
    Unexpected { expected: ControlCode, got: ControlCode },
    Invalid(MessageError),
}

impl Rejection {
    /// Outcome the responder sends back before aborting.
    pub(crate) fn reply(&self) -> ControlMessage {
        match self {
            Rejection::Unexpected { .. } => ControlMessage::UnexpectedCommand,
            Rejection::Invalid(e) => ControlMessage::InvalidContent(Some(e.invalid_content_report())),
        }
    }
}

/// Accept only `expected`, decoded into its typed payload by `pick`.
pub(crate) fn expect<T>(
    envelope: &Envelope,
    expected: ControlCode,
    pick: impl FnOnce(ControlMessage) -> Option<T>,
) -> Result<T, Rejection> {
    if envelope.code != expected {
        return Err(Rejection::Unexpected {
            expected,
            got: envelope.code,
        });
    }
    let message = ControlMessage::try_from(envelope).map_err(Rejection::Invalid)?;
    let got = message.code();
    pick(message).ok_or(Rejection::Unexpected { expected, got })
}

/// If `envelope` is one of the failure outcomes, its optional reason.
pub(crate) fn peer_error(envelope: &Envelope) -> Option<Option<String>> {
    match ControlMessage::try_from(envelope) {
        Ok(
            ControlMessage::InvalidContent(report)
            | ControlMessage::ReconciliationError(report)
            | ControlMessage::AmplificationError(report),
        ) => Some(report.map(|r| r.error_message)),
        Ok(ControlMessage::UnexpectedCommand) => Some(None),
        _ => None,
    }
}
