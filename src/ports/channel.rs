use thiserror::Error;

use crate::protocol::{ControlMessage, Envelope, FrameError, MessageError};

/// Errors surfaced by control channel operations.
#[derive(Debug, Error)]
pub enum ChannelPortError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("channel closed")]
    Closed,
    #[error("peer did not answer within the read timeout")]
    TimedOut,
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("message encoding error: {0}")]
    Message(#[from] MessageError),
    #[error("frame of {0} bytes exceeds limit")]
    Oversized(usize),
}

/// Ordered, reliable, point-to-point transport for control envelopes.
///
/// One instance is one session between exactly two parties. Implementations
/// block in [`recv`](ControlChannel::recv) until the peer's next envelope is
/// available; connection-level timeouts belong to the implementation.
pub trait ControlChannel {
    /// Fire-and-forget send.
    ///
    /// # Errors
    /// * `ChannelPortError::Closed` if the peer is gone.
    /// * `ChannelPortError::Io` / `Frame` on transport failure.
    fn send(&mut self, envelope: Envelope) -> Result<(), ChannelPortError>;

    /// Block for the next envelope from the peer.
    ///
    /// # Errors
    /// * `ChannelPortError::Closed` once the peer closed its side.
    /// * `ChannelPortError::Io` / `Frame` on transport or decoding failure.
    fn recv(&mut self) -> Result<Envelope, ChannelPortError>;

    /// Send, then block for the single next reply.
    ///
    /// # Errors
    /// Any error of [`send`](ControlChannel::send) or [`recv`](ControlChannel::recv).
    fn request(&mut self, envelope: Envelope) -> Result<Envelope, ChannelPortError> {
        self.send(envelope)?;
        self.recv()
    }

    /// Encode and send a typed message.
    ///
    /// # Errors
    /// `ChannelPortError::Message` if the payload cannot be encoded, otherwise as `send`.
    fn send_message(&mut self, message: &ControlMessage) -> Result<(), ChannelPortError> {
        let envelope = message.to_envelope()?;
        self.send(envelope)
    }

    /// Encode a typed message, send it and block for the reply envelope.
    ///
    /// # Errors
    /// As [`send_message`](ControlChannel::send_message) and `recv`.
    fn request_message(&mut self, message: &ControlMessage) -> Result<Envelope, ChannelPortError> {
        let envelope = message.to_envelope()?;
        self.request(envelope)
    }
}

impl<C: ControlChannel + ?Sized> ControlChannel for &mut C {
    fn send(&mut self, envelope: Envelope) -> Result<(), ChannelPortError> {
        (**self).send(envelope)
    }
    fn recv(&mut self) -> Result<Envelope, ChannelPortError> {
        (**self).recv()
    }
}

impl<C: ControlChannel + ?Sized> ControlChannel for Box<C> {
    fn send(&mut self, envelope: Envelope) -> Result<(), ChannelPortError> {
        (**self).send(envelope)
    }
    fn recv(&mut self) -> Result<Envelope, ChannelPortError> {
        (**self).recv()
    }
}

/// Opens one control channel session per local request.
pub trait ChannelConnector {
    type Channel: ControlChannel;

    /// Establish a fresh session with the peer (accept for the responder,
    /// connect for the initiator).
    ///
    /// # Errors
    /// `ChannelPortError::Io` if the session cannot be established.
    fn open(&mut self) -> Result<Self::Channel, ChannelPortError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ControlCode;
    use std::collections::VecDeque;

    struct LoopbackChannel {
        queue: VecDeque<Envelope>,
        closed: bool,
    }

    impl ControlChannel for LoopbackChannel {
        fn send(&mut self, envelope: Envelope) -> Result<(), ChannelPortError> {
            if self.closed {
                return Err(ChannelPortError::Closed);
            }
            self.queue.push_back(envelope);
            Ok(())
        }
        fn recv(&mut self) -> Result<Envelope, ChannelPortError> {
            self.queue.pop_front().ok_or(ChannelPortError::Closed)
        }
    }

    #[test]
    fn request_sends_then_receives() {
        let mut ch = LoopbackChannel {
            queue: VecDeque::new(),
            closed: false,
        };
        let reply = ch.request_message(&ControlMessage::AmplificationSuccess).unwrap();
        assert_eq!(reply.code, ControlCode::AmplificationSuccess);
        assert!(matches!(ch.recv(), Err(ChannelPortError::Closed)));
    }

    #[test]
    fn forwarding_through_mut_ref_and_box() {
        let mut inner = LoopbackChannel {
            queue: VecDeque::new(),
            closed: true,
        };
        let mut by_ref = &mut inner;
        assert!(matches!(
            ControlChannel::send(&mut by_ref, Envelope::bare(ControlCode::UnexpectedCommand)),
            Err(ChannelPortError::Closed)
        ));
        let mut boxed: Box<dyn ControlChannel> = Box::new(LoopbackChannel {
            queue: VecDeque::new(),
            closed: false,
        });
        boxed.send(Envelope::bare(ControlCode::ReconciliationFinished)).unwrap();
        assert_eq!(boxed.recv().unwrap().code, ControlCode::ReconciliationFinished);
    }
}
