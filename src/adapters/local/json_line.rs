// src/adapters/local/json_line.rs
use std::io::{BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use serde::de::DeserializeOwned;

use crate::ports::{KeyReply, RequestSource, RequestSourceError};

/// Local request endpoint speaking newline-delimited JSON over TCP.
///
/// Each local connection carries exactly one request line; the reply line is
/// written back on the same connection and the connection is then closed.
#[derive(Debug)]
pub struct JsonLineSource<Req> {
    listener: TcpListener,
    pending: Option<TcpStream>,
    _request: PhantomData<fn() -> Req>,
}

impl<Req> JsonLineSource<Req> {
    /// # Errors
    /// I/O error if the endpoint cannot be bound.
    pub fn bind<A: ToSocketAddrs>(addr: A) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        tracing::info!(addr = ?listener.local_addr().ok(), "local endpoint bound");
        Ok(Self {
            listener,
            pending: None,
            _request: PhantomData,
        })
    }

    /// # Errors
    /// I/O error from the underlying listener.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl<Req: DeserializeOwned> RequestSource for JsonLineSource<Req> {
    type Request = Req;

    fn next_request(&mut self) -> Result<Option<Req>, RequestSourceError> {
        // An unanswered request is dropped with its connection.
        self.pending = None;
        loop {
            let (stream, peer) = self.listener.accept()?;
            tracing::debug!(%peer, "local request connection");
            let mut line = String::new();
            if BufReader::new(&stream).read_line(&mut line)? == 0 {
                tracing::warn!(%peer, "local connection closed without a request");
                continue;
            }
            // Kept pending either way so a malformed request can be answered.
            self.pending = Some(stream);
            return Ok(Some(serde_json::from_str(line.trim_end())?));
        }
    }

    fn reply(&mut self, reply: &KeyReply) -> Result<(), RequestSourceError> {
        let Some(mut stream) = self.pending.take() else {
            return Err(RequestSourceError::NoPendingRequest);
        };
        let mut body = serde_json::to_vec(reply)?;
        body.push(b'\n');
        stream.write_all(&body)?;
        stream.flush()?;
        Ok(())
    }
}
