//! Scriptable in-memory engine used to exercise the negotiation flow.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::protocol::IceCandidateBlob;
use crate::session::error::{
    AnswerApplicationError, CandidateApplicationError, MediaAcquisitionError, MediaFault,
    OfferGenerationError,
};
use crate::session::MediaOptions;

use super::{CandidateSink, PeerEngine, PeerSession};

#[derive(Default)]
struct Shared {
    fail_media: Option<MediaFault>,
    fail_offer: bool,
    fail_answer: bool,
    fail_candidate: bool,
    offer_sdp: String,
    created: usize,
    live: usize,
    closed: usize,
    last_media: Option<MediaOptions>,
    answers: Vec<String>,
    remote_candidates: Vec<IceCandidateBlob>,
    sink: Option<CandidateSink>,
}

#[derive(Clone)]
pub struct MockEngine {
    shared: Arc<Mutex<Shared>>,
}

impl MockEngine {
    pub fn new() -> Self {
        let shared = Shared {
            offer_sdp: "MOCK_OFFER".into(),
            ..Shared::default()
        };
        Self {
            shared: Arc::new(Mutex::new(shared)),
        }
    }

    pub fn with_offer(self, sdp: impl Into<String>) -> Self {
        self.shared.lock().unwrap().offer_sdp = sdp.into();
        self
    }

    pub fn fail_media(self, fault: MediaFault) -> Self {
        self.shared.lock().unwrap().fail_media = Some(fault);
        self
    }

    pub fn fail_offer(self) -> Self {
        self.shared.lock().unwrap().fail_offer = true;
        self
    }

    pub fn fail_answer(self) -> Self {
        self.shared.lock().unwrap().fail_answer = true;
        self
    }

    pub fn fail_candidate(self) -> Self {
        self.shared.lock().unwrap().fail_candidate = true;
        self
    }

    /// Sessions created over the engine's lifetime.
    pub fn created(&self) -> usize {
        self.shared.lock().unwrap().created
    }

    /// Sessions currently alive (created and not yet closed).
    pub fn live(&self) -> usize {
        self.shared.lock().unwrap().live
    }

    pub fn closed(&self) -> usize {
        self.shared.lock().unwrap().closed
    }

    pub fn last_media(&self) -> Option<MediaOptions> {
        self.shared.lock().unwrap().last_media
    }

    pub fn answers(&self) -> Vec<String> {
        self.shared.lock().unwrap().answers.clone()
    }

    pub fn remote_candidates(&self) -> Vec<IceCandidateBlob> {
        self.shared.lock().unwrap().remote_candidates.clone()
    }

    /// Emit a trickle-ICE candidate from the live session, as the real
    /// engine would from its gathering callback.
    pub fn emit_local_candidate(&self, candidate: IceCandidateBlob) -> bool {
        let shared = self.shared.lock().unwrap();
        match &shared.sink {
            Some(sink) => sink.send(candidate).is_ok(),
            None => false,
        }
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PeerEngine for MockEngine {
    type Session = MockSession;

    async fn create_session(
        &self,
        media: MediaOptions,
        candidates: CandidateSink,
    ) -> Result<MockSession, MediaAcquisitionError> {
        let mut shared = self.shared.lock().unwrap();
        if let Some(fault) = shared.fail_media {
            return Err(MediaAcquisitionError::new(fault));
        }
        shared.created += 1;
        shared.live += 1;
        shared.last_media = Some(media);
        shared.sink = Some(candidates);
        Ok(MockSession {
            shared: Arc::clone(&self.shared),
        })
    }
}

pub struct MockSession {
    shared: Arc<Mutex<Shared>>,
}

#[async_trait]
impl PeerSession for MockSession {
    async fn create_offer(&mut self) -> Result<String, OfferGenerationError> {
        let shared = self.shared.lock().unwrap();
        if shared.fail_offer {
            return Err(OfferGenerationError("scripted offer failure".into()));
        }
        Ok(shared.offer_sdp.clone())
    }

    async fn apply_answer(&mut self, answer: &str) -> Result<(), AnswerApplicationError> {
        let mut shared = self.shared.lock().unwrap();
        if shared.fail_answer {
            return Err(AnswerApplicationError("scripted answer failure".into()));
        }
        shared.answers.push(answer.to_string());
        Ok(())
    }

    async fn add_remote_candidate(
        &mut self,
        candidate: IceCandidateBlob,
    ) -> Result<(), CandidateApplicationError> {
        let mut shared = self.shared.lock().unwrap();
        if shared.fail_candidate {
            return Err(CandidateApplicationError("scripted candidate failure".into()));
        }
        shared.remote_candidates.push(candidate);
        Ok(())
    }

    async fn close(&mut self) {
        let mut shared = self.shared.lock().unwrap();
        shared.live -= 1;
        shared.closed += 1;
        shared.sink = None;
    }
}
