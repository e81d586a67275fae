use rand_core::{CryptoRngCore, OsRng};

use crate::application::amplification::{amplify_initiator, amplify_responder_with};
use crate::application::errors::SessionError;
use crate::application::reconciliation::{InitiatorParams, reconcile_initiator, reconcile_responder};
use crate::domain::Role;
use crate::ports::{
    AliceRequest, BobRequest, ChannelPortError, ControlChannel, ErrorCorrection, Extractor,
    KeyReply, ProtocolObserver,
};

/// One party's end-to-end run over a single control channel session.
pub trait Session {
    type Request;

    fn role(&self) -> Role;

    /// Run reconciliation, then privacy amplification if requested.
    ///
    /// # Errors
    /// [`SessionError`] if either stage fails; no key is returned then.
    fn run<C: ControlChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        request: Self::Request,
        observer: &dyn ProtocolObserver,
    ) -> Result<KeyReply, SessionError>;
}

/// Alice's side: responder in both protocols.
pub struct AliceSession {
    engine: Box<dyn ErrorCorrection + Send>,
    extractor: Box<dyn Extractor + Send>,
}

impl AliceSession {
    #[must_use]
    pub fn new(engine: Box<dyn ErrorCorrection + Send>, extractor: Box<dyn Extractor + Send>) -> Self {
        Self { engine, extractor }
    }
}

impl Session for AliceSession {
    type Request = AliceRequest;

    fn role(&self) -> Role {
        Role::Responder
    }

    fn run<C: ControlChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        request: AliceRequest,
        observer: &dyn ProtocolObserver,
    ) -> Result<KeyReply, SessionError> {
        let reconciled = reconcile_responder(
            channel,
            &*self.engine,
            &request.alice_symbols,
            request.mdr_dimension,
            observer,
        )?;
        if !request.privacy_amplification {
            return Ok(KeyReply::Reconciled(reconciled));
        }
        let first = match channel.recv() {
            Ok(envelope) => envelope,
            Err(ChannelPortError::Closed) => return Err(SessionError::PeerSkippedAmplification),
            Err(e) => return Err(e.into()),
        };
        let key = amplify_responder_with(channel, &*self.extractor, &reconciled, first, observer)?;
        Ok(KeyReply::Final(key))
    }
}

/// Bob's side: initiator in both protocols, owner of seed generation.
pub struct BobSession<R: CryptoRngCore = OsRng> {
    engine: Box<dyn ErrorCorrection + Send>,
    extractor: Box<dyn Extractor + Send>,
    rng: R,
}

impl BobSession<OsRng> {
    #[must_use]
    pub fn new(engine: Box<dyn ErrorCorrection + Send>, extractor: Box<dyn Extractor + Send>) -> Self {
        Self::with_rng(engine, extractor, OsRng)
    }
}

impl<R: CryptoRngCore> BobSession<R> {
    #[must_use]
    pub fn with_rng(
        engine: Box<dyn ErrorCorrection + Send>,
        extractor: Box<dyn Extractor + Send>,
        rng: R,
    ) -> Self {
        Self {
            engine,
            extractor,
            rng,
        }
    }
}

impl<R: CryptoRngCore> Session for BobSession<R> {
    type Request = BobRequest;

    fn role(&self) -> Role {
        Role::Initiator
    }

    fn run<C: ControlChannel + ?Sized>(
        &mut self,
        channel: &mut C,
        request: BobRequest,
        observer: &dyn ProtocolObserver,
    ) -> Result<KeyReply, SessionError> {
        let params = InitiatorParams {
            beta: request.beta,
            signal_to_noise_ratio: request.signal_to_noise_ratio,
            mdr_dimension: request.mdr_dimension,
        };
        let reconciled =
            reconcile_initiator(channel, &*self.engine, &request.bob_symbols, params, observer)?;
        let Some(ratio) = request.secret_key_ratio else {
            return Ok(KeyReply::Reconciled(reconciled));
        };
        let key = amplify_initiator(
            channel,
            &*self.extractor,
            &reconciled,
            ratio,
            &mut self.rng,
            observer,
        )?;
        Ok(KeyReply::Final(key))
    }
}
