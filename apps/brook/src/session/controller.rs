//! Sequencing core for one negotiation attempt.
//!
//! The controller owns the live peer session and the pending-offer slot,
//! and is driven entirely from the session event loop: every handler runs
//! on that single task, so there is no parallel mutation of session state.
//! Handlers invoked against a disposed or disposing session skip with a log
//! instead of erroring; late and duplicate messages are expected.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::engine::{CandidateSink, PeerEngine, PeerSession};
use crate::protocol::{IceCandidateBlob, SignalingMessage};
use crate::transport::MessageSender;

use super::{MediaOptions, PlaybackSink, SessionState};

/// Static configuration for one client session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub media: MediaOptions,
    /// Upstream source announced to the server before negotiation begins
    /// (ingest sessions only).
    pub source: Option<String>,
}

impl SessionConfig {
    pub fn loopback() -> Self {
        Self {
            media: MediaOptions::sendrecv(),
            source: None,
        }
    }

    pub fn ingest(url: impl Into<String>) -> Self {
        Self {
            media: MediaOptions::recvonly(),
            source: Some(url.into()),
        }
    }
}

pub struct SessionController<E: PeerEngine> {
    engine: E,
    outbound: Arc<dyn MessageSender>,
    playback: Box<dyn PlaybackSink>,
    state_tx: watch::Sender<SessionState>,
    candidate_tx: CandidateSink,
    config: SessionConfig,
    session: Option<E::Session>,
    pending_offer: bool,
}

impl<E: PeerEngine> SessionController<E> {
    pub fn new(
        engine: E,
        outbound: Arc<dyn MessageSender>,
        playback: Box<dyn PlaybackSink>,
        config: SessionConfig,
        state_tx: watch::Sender<SessionState>,
        candidate_tx: CandidateSink,
    ) -> Self {
        Self {
            engine,
            outbound,
            playback,
            state_tx,
            candidate_tx,
            config,
            session: None,
            pending_offer: false,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Begin a negotiation attempt. Valid only from `Idle`; a second live
    /// peer session must never be created, so anything else is rejected.
    pub async fn start(&mut self) {
        if self.state() != SessionState::Idle {
            warn!(state = %self.state(), "start rejected; negotiation already in progress");
            return;
        }

        if let Some(source) = self.config.source.clone() {
            info!(%source, "announcing ingest source");
            self.outbound.send(SignalingMessage::RtspUrl(source));
        }

        self.set_state(SessionState::Negotiating);

        let mut session = match self
            .engine
            .create_session(self.config.media, self.candidate_tx.clone())
            .await
        {
            Ok(session) => session,
            Err(err) => {
                self.fail(err.to_string()).await;
                return;
            }
        };

        let offer = match session.create_offer().await {
            Ok(offer) => offer,
            Err(err) => {
                // Park the half-built session so teardown disposes it.
                self.session = Some(session);
                self.fail(err.to_string()).await;
                return;
            }
        };

        self.session = Some(session);
        self.pending_offer = true;
        self.outbound.send(SignalingMessage::ProcessOffer(offer));
        debug!("offer sent; awaiting answer");
    }

    /// Tear the session down. Idempotent: a stop from `Idle` is a logged
    /// no-op and sends nothing. Never fails; disposal errors stay internal.
    pub async fn stop(&mut self) {
        if self.state() == SessionState::Idle {
            debug!("stop skipped; session already idle");
            return;
        }

        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
        self.pending_offer = false;
        self.set_state(SessionState::Idle);
        self.outbound.send(SignalingMessage::Stop);
    }

    /// Apply the remote answer to the outstanding offer. Late or duplicate
    /// answers are skipped, not errors: retries make them routine.
    pub async fn on_answer(&mut self, answer: String) {
        let session = match self.session.as_mut() {
            Some(session) if self.pending_offer => session,
            _ => {
                debug!("answer skipped; no offer awaiting one");
                return;
            }
        };
        if let Err(err) = session.apply_answer(&answer).await {
            self.fail(err.to_string()).await;
            return;
        }
        self.pending_offer = false;
        self.set_state(SessionState::Active);
        self.playback.start_remote_playback();
    }

    /// Forward a remotely discovered candidate to the engine. A single bad
    /// candidate must not abort negotiation; ICE tolerates candidate loss.
    pub async fn on_remote_candidate(&mut self, candidate: IceCandidateBlob) {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => {
                debug!("remote candidate skipped; no live session");
                return;
            }
        };
        if let Err(err) = session.add_remote_candidate(candidate).await {
            warn!("{err}");
        }
    }

    /// Forward a locally discovered candidate to the server immediately.
    /// Candidates carry no ordering relative to the offer/answer exchange.
    pub fn on_local_candidate(&mut self, candidate: IceCandidateBlob) {
        if self.session.is_none() {
            debug!("local candidate skipped; no live session");
            return;
        }
        self.outbound.send(SignalingMessage::AddIce(candidate));
    }

    /// Surface an unrecoverable error to the log and the server, then tear
    /// the session down.
    async fn fail(&mut self, message: String) {
        error!("{message}");
        self.outbound.send(SignalingMessage::Error(message));
        self.stop().await;
    }

    fn set_state(&mut self, next: SessionState) {
        let previous = self.state();
        if previous == next {
            return;
        }
        info!(from = %previous, to = %next, "session state changed");
        self.state_tx.send_replace(next);
    }
}
