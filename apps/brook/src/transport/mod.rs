use thiserror::Error;

use crate::protocol::SignalingMessage;

pub mod websocket;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("signaling setup failed: {0}")]
    Setup(String),
    #[error("signaling channel is not open")]
    ChannelUnavailable,
}

/// Outbound half of the signaling channel. Delivery is best-effort: `send`
/// never blocks and never fails the caller; when the channel is down the
/// message is dropped and logged.
pub trait MessageSender: Send + Sync {
    fn send(&self, message: SignalingMessage);
}
