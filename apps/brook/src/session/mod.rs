use std::fmt;

pub mod controller;
pub mod error;
pub mod router;

pub use controller::{SessionConfig, SessionController};

/// Lifecycle of one negotiation attempt. Gates which user actions are
/// accepted: only `Idle` permits a new start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Negotiating,
    Active,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Negotiating => "negotiating",
            SessionState::Active => "active",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UI-side sink for the remote stream. Invoked exactly once per successful
/// negotiation, when the answer has been applied.
pub trait PlaybackSink: Send {
    fn start_remote_playback(&mut self);
}

/// Requested direction of the media session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDirection {
    SendRecv,
    RecvOnly,
}

/// Track kinds and direction requested from the peer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaOptions {
    pub audio: bool,
    pub video: bool,
    pub direction: MediaDirection,
}

impl MediaOptions {
    /// Bidirectional audio+video, the loopback default.
    pub fn sendrecv() -> Self {
        Self {
            audio: true,
            video: true,
            direction: MediaDirection::SendRecv,
        }
    }

    /// Receive-only audio+video, used when the server pulls in an upstream
    /// source on our behalf.
    pub fn recvonly() -> Self {
        Self {
            audio: true,
            video: true,
            direction: MediaDirection::RecvOnly,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::protocol::SignalingMessage;
    use crate::transport::MessageSender;

    use super::PlaybackSink;

    /// Records every outbound message for assertions.
    #[derive(Clone, Default)]
    pub struct CaptureSender {
        sent: Arc<Mutex<Vec<SignalingMessage>>>,
    }

    impl CaptureSender {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<SignalingMessage> {
            self.sent.lock().unwrap().clone()
        }

        pub fn ids(&self) -> Vec<&'static str> {
            self.sent().iter().map(SignalingMessage::id).collect()
        }
    }

    impl MessageSender for CaptureSender {
        fn send(&self, message: SignalingMessage) {
            self.sent.lock().unwrap().push(message);
        }
    }

    /// Counts playback starts so tests can assert the exactly-once contract.
    #[derive(Clone, Default)]
    pub struct PlaybackProbe {
        starts: Arc<AtomicUsize>,
    }

    impl PlaybackProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn starts(&self) -> usize {
            self.starts.load(Ordering::SeqCst)
        }
    }

    impl PlaybackSink for PlaybackProbe {
        fn start_remote_playback(&mut self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
    }
}
