// src/adapters/channel/memory.rs
use std::sync::mpsc::{Receiver, Sender, channel};

use crate::ports::{ChannelPortError, ControlChannel};
use crate::protocol::{Envelope, decode_envelope, encode_envelope};

/// In-process duplex control channel.
///
/// Envelopes are encoded to their byte form on send and decoded on receive,
/// so both parties exercise the same codec as over a socket. Dropping one end
/// makes the other end's `recv` return `ChannelPortError::Closed`.
#[derive(Debug)]
pub struct MemoryChannel {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl MemoryChannel {
    /// Two connected endpoints.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = channel();
        let (b_tx, a_rx) = channel();
        (Self { tx: a_tx, rx: a_rx }, Self { tx: b_tx, rx: b_rx })
    }
}

impl ControlChannel for MemoryChannel {
    fn send(&mut self, envelope: Envelope) -> Result<(), ChannelPortError> {
        let bytes = encode_envelope(&envelope)?;
        self.tx.send(bytes).map_err(|_| ChannelPortError::Closed)
    }

    fn recv(&mut self) -> Result<Envelope, ChannelPortError> {
        let bytes = self.rx.recv().map_err(|_| ChannelPortError::Closed)?;
        Ok(decode_envelope(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ControlCode;

    #[test]
    fn pair_is_duplex() {
        let (mut a, mut b) = MemoryChannel::pair();
        a.send(Envelope::bare(ControlCode::ReconciliationFinished)).unwrap();
        assert_eq!(b.recv().unwrap().code, ControlCode::ReconciliationFinished);
        b.send(Envelope::bare(ControlCode::AmplificationSuccess)).unwrap();
        assert_eq!(a.recv().unwrap().code, ControlCode::AmplificationSuccess);
    }

    #[test]
    fn dropped_peer_closes() {
        let (mut a, b) = MemoryChannel::pair();
        drop(b);
        assert!(matches!(a.recv(), Err(ChannelPortError::Closed)));
        assert!(matches!(
            a.send(Envelope::bare(ControlCode::UnexpectedCommand)),
            Err(ChannelPortError::Closed)
        ));
    }
}
