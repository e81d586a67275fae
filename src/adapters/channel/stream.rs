// src/adapters/channel/stream.rs
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::ports::{ChannelConnector, ChannelPortError, ControlChannel};
use crate::protocol::{Envelope, decode_envelope, encode_envelope};

/// Upper bound on one encoded envelope. Syndromes for large blocks are big,
/// but anything past this is a corrupt length prefix.
pub const MAX_FRAME_LEN: usize = 256 * 1024 * 1024;

/// Control channel over any byte stream.
///
/// Frame layout: `u32` big-endian length of what follows, then the envelope
/// bytes (`u16` code + one CBOR item).
#[derive(Debug)]
pub struct StreamChannel<S> {
    stream: S,
}

impl<S: Read + Write> StreamChannel<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> ControlChannel for StreamChannel<S> {
    fn send(&mut self, envelope: Envelope) -> Result<(), ChannelPortError> {
        let body = encode_envelope(&envelope)?;
        if body.len() > MAX_FRAME_LEN {
            return Err(ChannelPortError::Oversized(body.len()));
        }
        let len = u32::try_from(body.len()).map_err(|_| ChannelPortError::Oversized(body.len()))?;
        self.stream.write_all(&len.to_be_bytes()).map_err(closed_or_io)?;
        self.stream.write_all(&body).map_err(closed_or_io)?;
        self.stream.flush().map_err(closed_or_io)?;
        Ok(())
    }

    fn recv(&mut self) -> Result<Envelope, ChannelPortError> {
        let mut len_buf = [0u8; 4];
        self.stream.read_exact(&mut len_buf).map_err(closed_or_io)?;
        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_FRAME_LEN {
            return Err(ChannelPortError::Oversized(len));
        }
        let mut body = vec![0u8; len];
        self.stream.read_exact(&mut body).map_err(closed_or_io)?;
        Ok(decode_envelope(&body)?)
    }
}

fn closed_or_io(e: std::io::Error) -> ChannelPortError {
    match e.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::BrokenPipe | ErrorKind::ConnectionReset => {
            ChannelPortError::Closed
        }
        // Read timeouts report WouldBlock on Unix and TimedOut on Windows.
        ErrorKind::WouldBlock | ErrorKind::TimedOut => ChannelPortError::TimedOut,
        _ => ChannelPortError::Io(e),
    }
}

/// Opens TCP control sessions: Alice accepts, Bob connects.
///
/// Every opened stream gets the configured read timeout, so a peer that goes
/// silent without closing surfaces as [`ChannelPortError::TimedOut`] instead
/// of blocking the session forever. Without one the wait is unbounded.
#[derive(Debug)]
pub struct TcpConnector {
    mode: Mode,
    read_timeout: Option<Duration>,
}

#[derive(Debug)]
enum Mode {
    Accept(TcpListener),
    Connect {
        addr: SocketAddr,
        timeout: Option<Duration>,
    },
}

impl TcpConnector {
    /// Bind once; every `open` accepts one peer connection.
    ///
    /// # Errors
    /// I/O error if the address cannot be bound.
    pub fn listen<A: ToSocketAddrs>(addr: A) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        tracing::info!(addr = ?listener.local_addr().ok(), "control listener bound");
        Ok(Self {
            mode: Mode::Accept(listener),
            read_timeout: None,
        })
    }

    /// Connect to `addr` on every `open`.
    ///
    /// # Errors
    /// I/O error if `addr` does not resolve.
    pub fn connect<A: ToSocketAddrs>(addr: A, timeout: Option<Duration>) -> std::io::Result<Self> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "address did not resolve"))?;
        Ok(Self {
            mode: Mode::Connect { addr, timeout },
            read_timeout: None,
        })
    }

    /// Longest wait for the peer's next bytes on an opened channel.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Bound address when listening.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.mode {
            Mode::Accept(l) => l.local_addr().ok(),
            Mode::Connect { .. } => None,
        }
    }
}

impl ChannelConnector for TcpConnector {
    type Channel = StreamChannel<TcpStream>;

    fn open(&mut self) -> Result<Self::Channel, ChannelPortError> {
        let stream = match &self.mode {
            Mode::Accept(listener) => {
                tracing::info!("waiting for the peer to connect");
                let (stream, peer) = listener.accept()?;
                tracing::info!(%peer, "peer connected");
                stream
            }
            Mode::Connect { addr, timeout } => {
                tracing::info!(%addr, "connecting to peer");
                match timeout {
                    Some(t) => TcpStream::connect_timeout(addr, *t)?,
                    None => TcpStream::connect(*addr)?,
                }
            }
        };
        stream.set_nodelay(true)?;
        stream.set_read_timeout(self.read_timeout)?;
        Ok(StreamChannel::new(stream))
    }
}
