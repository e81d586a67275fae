// src/adapters/observer/tracing.rs
use crate::ports::{ProtocolEvent, ProtocolObserver};

/// Forwards protocol events to `tracing`.
///
/// Message traffic and transitions go to `debug`, run boundaries to `info`,
/// soft anomalies to `warn` and aborts to `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProtocolObserver for TracingObserver {
    fn on_event(&self, event: &ProtocolEvent) {
        match event {
            ProtocolEvent::Started { stage, role } => {
                tracing::info!(stage = stage.as_str(), %role, "protocol started");
            }
            ProtocolEvent::ImaginarySymbols { role } => {
                tracing::warn!(%role, "symbols have an imaginary part; only real parts are used");
            }
            ProtocolEvent::Transition { stage, from, to } => {
                tracing::debug!(stage = stage.as_str(), from, to, "state transition");
            }
            ProtocolEvent::Sent { code } => tracing::debug!(?code, "sent"),
            ProtocolEvent::Received { code } => tracing::debug!(?code, "received"),
            ProtocolEvent::EngineCall { operation } => {
                tracing::debug!(operation, "calling error correction");
            }
            ProtocolEvent::ExtractorCall {
                extractor,
                input_len,
                output_len,
            } => {
                tracing::debug!(extractor, input_len, output_len, "calling extractor");
            }
            ProtocolEvent::Discards { kept, discarded } => {
                tracing::info!(kept, discarded, "frame discards");
            }
            ProtocolEvent::Completed { stage, key_len } => {
                tracing::info!(stage = stage.as_str(), key_len, "protocol completed");
            }
            ProtocolEvent::Aborted { stage, reason } => {
                tracing::error!(stage = stage.as_str(), %reason, "protocol aborted");
            }
        }
    }
}
