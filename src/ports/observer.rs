//! Per-run diagnostic sink.
//!
//! Every protocol invocation receives a `&dyn ProtocolObserver`. Events carry
//! lengths and counts only; no key, seed or frame bits ever reach an observer.

use crate::domain::Role;
use crate::protocol::ControlCode;

/// Which of the two protocols an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Reconciliation,
    Amplification,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Reconciliation => "reconciliation",
            Stage::Amplification => "amplification",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    Started {
        stage: Stage,
        role: Role,
    },
    /// Local symbols carry non-zero imaginary parts; the run continues.
    ImaginarySymbols {
        role: Role,
    },
    Transition {
        stage: Stage,
        from: &'static str,
        to: &'static str,
    },
    Sent {
        code: ControlCode,
    },
    Received {
        code: ControlCode,
    },
    EngineCall {
        operation: &'static str,
    },
    ExtractorCall {
        extractor: &'static str,
        input_len: usize,
        output_len: usize,
    },
    Discards {
        kept: usize,
        discarded: usize,
    },
    Completed {
        stage: Stage,
        key_len: usize,
    },
    Aborted {
        stage: Stage,
        reason: String,
    },
}

/// Receives the events of one protocol run.
pub trait ProtocolObserver {
    fn on_event(&self, event: &ProtocolEvent);
}

/// Observer that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProtocolObserver for NoopObserver {
    fn on_event(&self, _event: &ProtocolEvent) {}
}

impl<O: ProtocolObserver + ?Sized> ProtocolObserver for &O {
    fn on_event(&self, event: &ProtocolEvent) {
        (**self).on_event(event);
    }
}
