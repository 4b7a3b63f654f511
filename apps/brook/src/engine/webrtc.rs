//! Peer engine backed by the `webrtc` crate.

use std::sync::Arc;

use async_trait::async_trait;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;

use crate::protocol::IceCandidateBlob;
use crate::session::error::{
    AnswerApplicationError, CandidateApplicationError, MediaAcquisitionError, MediaFault,
    OfferGenerationError,
};
use crate::session::{MediaDirection, MediaOptions};

use super::{CandidateSink, PeerEngine, PeerSession};

const DEFAULT_STUN_SERVERS: &[&str] = &[
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
];

pub struct WebRtcEngine {
    ice_servers: Vec<String>,
}

impl WebRtcEngine {
    pub fn new(ice_servers: Vec<String>) -> Self {
        Self { ice_servers }
    }

    pub fn with_default_servers() -> Self {
        Self::new(DEFAULT_STUN_SERVERS.iter().map(|s| s.to_string()).collect())
    }

    fn rtc_config(&self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: self.ice_servers.clone(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }
}

fn unknown_fault(err: impl std::fmt::Display) -> MediaAcquisitionError {
    MediaAcquisitionError::with_detail(MediaFault::Unknown, err.to_string())
}

#[async_trait]
impl PeerEngine for WebRtcEngine {
    type Session = WebRtcSession;

    async fn create_session(
        &self,
        media: MediaOptions,
        candidates: CandidateSink,
    ) -> Result<WebRtcSession, MediaAcquisitionError> {
        if !media.audio && !media.video {
            return Err(MediaAcquisitionError::new(MediaFault::MalformedRequest));
        }

        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(unknown_fault)?;
        let registry =
            register_default_interceptors(Registry::new(), &mut media_engine).map_err(unknown_fault)?;
        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let pc = Arc::new(
            api.new_peer_connection(self.rtc_config())
                .await
                .map_err(unknown_fault)?,
        );

        let direction = match media.direction {
            MediaDirection::SendRecv => RTCRtpTransceiverDirection::Sendrecv,
            MediaDirection::RecvOnly => RTCRtpTransceiverDirection::Recvonly,
        };
        if media.audio {
            pc.add_transceiver_from_kind(
                RTPCodecType::Audio,
                Some(RTCRtpTransceiverInit {
                    direction,
                    send_encodings: vec![],
                }),
            )
            .await
            .map_err(unknown_fault)?;
        }
        if media.video {
            pc.add_transceiver_from_kind(
                RTPCodecType::Video,
                Some(RTCRtpTransceiverInit {
                    direction,
                    send_encodings: vec![],
                }),
            )
            .await
            .map_err(unknown_fault)?;
        }

        pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let sink = candidates.clone();
            Box::pin(async move {
                let Some(candidate) = candidate else {
                    tracing::debug!(target: "engine", "local candidate gathering complete");
                    return;
                };
                match candidate.to_json() {
                    Ok(init) => {
                        let blob = IceCandidateBlob {
                            candidate: init.candidate,
                            sdp_mid: init.sdp_mid,
                            sdp_mline_index: init.sdp_mline_index,
                        };
                        if sink.send(blob).is_err() {
                            tracing::debug!(
                                target: "engine",
                                "candidate sink closed; dropping local candidate"
                            );
                        }
                    }
                    Err(err) => tracing::warn!(
                        target: "engine",
                        "failed to serialize local candidate: {err}"
                    ),
                }
            })
        }));

        pc.on_peer_connection_state_change(Box::new(|state| {
            tracing::debug!(target: "engine", ?state, "peer connection state changed");
            Box::pin(async {})
        }));

        Ok(WebRtcSession { pc })
    }
}

pub struct WebRtcSession {
    pc: Arc<RTCPeerConnection>,
}

#[async_trait]
impl PeerSession for WebRtcSession {
    async fn create_offer(&mut self) -> Result<String, OfferGenerationError> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|err| OfferGenerationError(err.to_string()))?;
        let sdp = offer.sdp.clone();
        self.pc
            .set_local_description(offer)
            .await
            .map_err(|err| OfferGenerationError(err.to_string()))?;
        Ok(sdp)
    }

    async fn apply_answer(&mut self, answer: &str) -> Result<(), AnswerApplicationError> {
        let description = RTCSessionDescription::answer(answer.to_string())
            .map_err(|err| AnswerApplicationError(err.to_string()))?;
        self.pc
            .set_remote_description(description)
            .await
            .map_err(|err| AnswerApplicationError(err.to_string()))
    }

    async fn add_remote_candidate(
        &mut self,
        candidate: IceCandidateBlob,
    ) -> Result<(), CandidateApplicationError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            username_fragment: None,
        };
        self.pc
            .add_ice_candidate(init)
            .await
            .map_err(|err| CandidateApplicationError(err.to_string()))
    }

    async fn close(&mut self) {
        if let Err(err) = self.pc.close().await {
            tracing::warn!(target: "engine", "peer connection close reported an error: {err}");
        }
    }
}
