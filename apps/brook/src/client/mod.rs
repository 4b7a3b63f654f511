//! Session event loop and its public handle.
//!
//! All controller state lives on one spawned task: user commands, inbound
//! signaling frames, and locally discovered candidates are processed
//! strictly sequentially, which is what makes the controller's
//! disposed-session checks sufficient.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::engine::PeerEngine;
use crate::protocol::IceCandidateBlob;
use crate::session::router;
use crate::session::{PlaybackSink, SessionConfig, SessionController, SessionState};
use crate::transport::MessageSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Shutdown,
}

pub struct CallClient {
    command_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<SessionState>,
    task: tokio::task::JoinHandle<()>,
}

impl CallClient {
    /// Wire a controller to the signaling channel and spawn its event loop.
    /// `inbound` is the raw frame stream produced by the channel; the loop
    /// exits when it ends or a `Shutdown` command arrives, tearing any live
    /// session down first.
    pub fn spawn<E>(
        engine: E,
        outbound: Arc<dyn MessageSender>,
        inbound: mpsc::UnboundedReceiver<String>,
        playback: Box<dyn PlaybackSink>,
        config: SessionConfig,
    ) -> Self
    where
        E: PeerEngine + 'static,
        E::Session: 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (candidate_tx, candidate_rx) = mpsc::unbounded_channel();
        let controller =
            SessionController::new(engine, outbound, playback, config, state_tx, candidate_tx);
        let task = tokio::spawn(run(controller, command_rx, inbound, candidate_rx));
        Self {
            command_tx,
            state_rx,
            task,
        }
    }

    pub fn start(&self) {
        self.send(Command::Start);
    }

    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    fn send(&self, command: Command) {
        if self.command_tx.send(command).is_err() {
            debug!(?command, "session loop already gone; command dropped");
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Watch receiver for state transitions, for gating UI affordances.
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Wait for the event loop to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

async fn run<E: PeerEngine>(
    mut controller: SessionController<E>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut inbound: mpsc::UnboundedReceiver<String>,
    mut candidates: mpsc::UnboundedReceiver<IceCandidateBlob>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Start) => controller.start().await,
                Some(Command::Stop) => controller.stop().await,
                Some(Command::Shutdown) | None => break,
            },
            frame = inbound.recv() => match frame {
                Some(frame) => router::dispatch(&mut controller, &frame).await,
                None => {
                    info!("signaling channel closed; shutting the session down");
                    break;
                }
            },
            candidate = candidates.recv() => {
                if let Some(candidate) = candidate {
                    controller.on_local_candidate(candidate);
                }
            }
        }
    }
    controller.stop().await;
    debug!("session loop exited");
}
