use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::application::errors::SessionError;
use crate::ports::{ChannelConnector, KeyReply, ProtocolObserver, RequestSource, RequestSourceError};

use super::runner::Session;
use super::state::{SessionState, SessionTracker};

/// How the supervisor reacts to failed sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Stop after this many failures in a row; `0` never stops.
    pub max_consecutive_failures: u32,
    /// Pause after a failed session before taking the next request.
    pub backoff: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 0,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Why [`Supervisor::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    Shutdown,
    /// The request source has no more requests.
    Exhausted,
    FailureLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorReport {
    pub exit: SupervisorExit,
    pub completed: u64,
    pub failed: u64,
}

/// Serves local requests one session at a time.
///
/// Each session gets a fresh channel from the connector and its own working
/// set; nothing survives from one session to the next except counters.
pub struct Supervisor<S, Src, Conn> {
    session: S,
    source: Src,
    connector: Conn,
    policy: RestartPolicy,
    shutdown: Arc<AtomicBool>,
    tracker: SessionTracker,
}

impl<S, Src, Conn> Supervisor<S, Src, Conn>
where
    S: Session,
    Src: RequestSource<Request = S::Request>,
    Conn: ChannelConnector,
{
    pub fn new(session: S, source: Src, connector: Conn, policy: RestartPolicy) -> Self {
        Self {
            session,
            source,
            connector,
            policy,
            shutdown: Arc::new(AtomicBool::new(false)),
            tracker: SessionTracker::default(),
        }
    }

    /// Flag that stops the loop before the next request is taken.
    ///
    /// Checked between sessions only; a loop waiting on its request source
    /// notices it once that wait returns.
    #[must_use]
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.tracker.state()
    }

    /// Run until shutdown, source exhaustion or the failure limit.
    ///
    /// # Errors
    /// Only an internal state-machine violation is returned as an error;
    /// session failures are answered to the requester and counted.
    pub fn run(&mut self, observer: &dyn ProtocolObserver) -> Result<SupervisorReport, SessionError> {
        let role = self.session.role();
        let mut completed = 0u64;
        let mut failed = 0u64;
        let mut consecutive = 0u32;

        let exit = loop {
            if self.shutdown.load(Ordering::Relaxed) {
                break SupervisorExit::Shutdown;
            }
            self.tracker.transition(SessionState::AwaitingRequest)?;
            tracing::info!(%role, "waiting for a local request");

            let outcome = match self.source.next_request() {
                Ok(Some(request)) => {
                    self.tracker.transition(SessionState::RunningProtocol)?;
                    let span = tracing::info_span!("session", %role, n = completed + failed + 1);
                    let _guard = span.enter();
                    self.serve(request, observer)
                }
                Ok(None) => break SupervisorExit::Exhausted,
                Err(e) => {
                    tracing::warn!(error = %e, "local request rejected");
                    self.answer(&KeyReply::Failure(e.to_string()));
                    Err(SessionError::Request(e))
                }
            };

            match outcome {
                Ok(()) => {
                    self.tracker.transition(SessionState::Done)?;
                    completed += 1;
                    consecutive = 0;
                }
                Err(e) => {
                    self.tracker.transition(SessionState::Failed)?;
                    tracing::error!(%role, error = %e, "session failed");
                    failed += 1;
                    consecutive = consecutive.saturating_add(1);
                    if self.policy.max_consecutive_failures != 0
                        && consecutive >= self.policy.max_consecutive_failures
                    {
                        break SupervisorExit::FailureLimit;
                    }
                    if !self.policy.backoff.is_zero() {
                        std::thread::sleep(self.policy.backoff);
                    }
                }
            }
        };

        if self.tracker.state() != SessionState::Idle {
            self.tracker.transition(SessionState::Idle)?;
        }
        tracing::info!(%role, ?exit, completed, failed, "supervisor stopped");
        Ok(SupervisorReport {
            exit,
            completed,
            failed,
        })
    }

    fn serve(&mut self, request: S::Request, observer: &dyn ProtocolObserver) -> Result<(), SessionError> {
        let result = self
            .connector
            .open()
            .map_err(SessionError::from)
            .and_then(|mut channel| self.session.run(&mut channel, request, observer));
        match result {
            Ok(reply) => {
                self.source.reply(&reply)?;
                tracing::info!("key returned to local requester");
                Ok(())
            }
            Err(e) => {
                self.answer(&KeyReply::Failure(e.to_string()));
                Err(e)
            }
        }
    }

    fn answer(&mut self, reply: &KeyReply) {
        match self.source.reply(reply) {
            Ok(()) | Err(RequestSourceError::NoPendingRequest) => {}
            Err(e) => tracing::warn!(error = %e, "could not answer local requester"),
        }
    }
}
