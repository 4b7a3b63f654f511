//! Seam to the peer engine that performs the actual SDP/ICE mechanics.
//!
//! The controller only sequences operations; everything media-related is
//! behind these traits so the negotiation flow can be exercised against the
//! scriptable [`mock`] engine.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::protocol::IceCandidateBlob;
use crate::session::error::{
    AnswerApplicationError, CandidateApplicationError, MediaAcquisitionError, OfferGenerationError,
};
use crate::session::MediaOptions;

pub mod mock;
pub mod webrtc;

/// Where the engine delivers locally discovered ICE candidates. Candidates
/// are re-serialized onto the session's event loop, never handled on the
/// engine's own threads.
pub type CandidateSink = mpsc::UnboundedSender<IceCandidateBlob>;

#[async_trait]
pub trait PeerEngine: Send {
    type Session: PeerSession;

    /// Acquire local media and build a live peer session. The sink receives
    /// trickle-ICE candidates for the lifetime of the session.
    async fn create_session(
        &self,
        media: MediaOptions,
        candidates: CandidateSink,
    ) -> Result<Self::Session, MediaAcquisitionError>;
}

#[async_trait]
pub trait PeerSession: Send {
    async fn create_offer(&mut self) -> Result<String, OfferGenerationError>;

    async fn apply_answer(&mut self, answer: &str) -> Result<(), AnswerApplicationError>;

    async fn add_remote_candidate(
        &mut self,
        candidate: IceCandidateBlob,
    ) -> Result<(), CandidateApplicationError>;

    /// Dispose of the session, releasing engine-held media and transport
    /// resources. Disposal never fails; internal errors are logged.
    async fn close(&mut self);
}
