//! Inbound dispatch: one decoded frame goes to exactly one handler.
//!
//! Unrecognized tags are logged and dropped without touching session state;
//! forward compatibility with newer servers depends on that.

use tracing::{error, info, warn};

use crate::engine::PeerEngine;
use crate::protocol::{self, DecodeError, SignalingMessage};

use super::SessionController;

pub async fn dispatch<E: PeerEngine>(controller: &mut SessionController<E>, frame: &str) {
    match protocol::decode(frame) {
        Ok(message) => deliver(controller, message).await,
        Err(err @ DecodeError::UnknownId { .. }) => warn!("{err}"),
        Err(err) => warn!(frame_len = frame.len(), "dropping undecodable frame: {err}"),
    }
}

async fn deliver<E: PeerEngine>(controller: &mut SessionController<E>, message: SignalingMessage) {
    match message {
        SignalingMessage::SdpAnswer(answer) => controller.on_answer(answer).await,
        SignalingMessage::IceCandidate(candidate) => {
            controller.on_remote_candidate(candidate).await
        }
        SignalingMessage::Error(diagnostic) => {
            error!(%diagnostic, "server reported an error")
        }
        SignalingMessage::Info(payload) => info!(%payload, "server info"),
        SignalingMessage::RtspConnection(payload) => {
            info!(%payload, "ingest source connection status")
        }
        other => warn!(id = other.id(), "ignoring client-bound message from server"),
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::{mpsc, watch};

    use crate::engine::mock::MockEngine;
    use crate::session::testing::{CaptureSender, PlaybackProbe};
    use crate::session::{SessionConfig, SessionController, SessionState};

    use super::dispatch;

    fn controller(engine: &MockEngine) -> (SessionController<MockEngine>, watch::Receiver<SessionState>) {
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (candidate_tx, _candidate_rx) = mpsc::unbounded_channel();
        let controller = SessionController::new(
            engine.clone(),
            std::sync::Arc::new(CaptureSender::new()),
            Box::new(PlaybackProbe::new()),
            SessionConfig::loopback(),
            state_tx,
            candidate_tx,
        );
        (controller, state_rx)
    }

    #[tokio::test]
    async fn routes_answer_and_candidate_frames() {
        let engine = MockEngine::new();
        let (mut controller, state_rx) = controller(&engine);

        controller.start().await;
        dispatch(&mut controller, r#"{"id":"sdpAnswer","payload":"ANSWER_1"}"#).await;
        dispatch(
            &mut controller,
            r#"{"id":"iceCandidate","payload":{"candidate":"C1"}}"#,
        )
        .await;

        assert_eq!(*state_rx.borrow(), SessionState::Active);
        assert_eq!(engine.answers(), vec!["ANSWER_1".to_string()]);
        assert_eq!(engine.remote_candidates().len(), 1);
    }

    #[tokio::test]
    async fn candidate_before_start_leaves_idle() {
        let engine = MockEngine::new();
        let (mut controller, state_rx) = controller(&engine);

        dispatch(
            &mut controller,
            r#"{"id":"iceCandidate","payload":{"candidate":"C1"}}"#,
        )
        .await;

        assert_eq!(*state_rx.borrow(), SessionState::Idle);
        assert_eq!(engine.created(), 0);
    }

    #[tokio::test]
    async fn unknown_and_malformed_frames_are_inert() {
        let engine = MockEngine::new();
        let (mut controller, state_rx) = controller(&engine);

        controller.start().await;
        dispatch(&mut controller, r#"{"id":"serverShutdown","payload":1}"#).await;
        dispatch(&mut controller, "not json at all").await;
        dispatch(&mut controller, r#"{"id":"sdpAnswer","payload":42}"#).await;

        assert_eq!(*state_rx.borrow(), SessionState::Negotiating);
        assert!(engine.answers().is_empty());
    }

    #[tokio::test]
    async fn diagnostics_are_logged_without_state_changes() {
        let engine = MockEngine::new();
        let (mut controller, state_rx) = controller(&engine);

        controller.start().await;
        dispatch(&mut controller, r#"{"id":"error","payload":"boom"}"#).await;
        dispatch(&mut controller, r#"{"id":"info","payload":{"note":"hi"}}"#).await;
        dispatch(
            &mut controller,
            r#"{"id":"rtspConnection","payload":"connected"}"#,
        )
        .await;

        assert_eq!(*state_rx.borrow(), SessionState::Negotiating);
    }

    #[tokio::test]
    async fn client_bound_ids_from_server_are_ignored() {
        let engine = MockEngine::new();
        let (mut controller, state_rx) = controller(&engine);

        dispatch(&mut controller, r#"{"id":"processOffer","payload":"x"}"#).await;
        dispatch(&mut controller, r#"{"id":"stop"}"#).await;

        assert_eq!(*state_rx.borrow(), SessionState::Idle);
        assert_eq!(engine.created(), 0);
    }
}
