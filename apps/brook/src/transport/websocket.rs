//! WebSocket signaling channel.
//!
//! One writer task drains the outbound queue into the socket; one reader
//! task surfaces inbound text frames, undecoded, to the session loop. The
//! channel itself preserves order and never duplicates; interpreting frames
//! is the router's job.

use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{error::ProtocolError, Error as WsError, Message},
};
use url::Url;

use crate::protocol::SignalingMessage;

use super::{MessageSender, TransportError};

pub struct WebSocketSignaling {
    outbound_tx: mpsc::UnboundedSender<SignalingMessage>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WebSocketSignaling {
    /// Connect to the signaling endpoint. Returns the channel handle and the
    /// stream of raw inbound frames; the stream ends when the socket closes.
    pub async fn connect(
        endpoint: &Url,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<String>), TransportError> {
        let (ws_stream, _) = connect_async(endpoint.as_str())
            .await
            .map_err(|err| TransportError::Setup(format!("websocket connect failed: {err}")))?;
        tracing::debug!(target: "signaling", url = %endpoint, "websocket connected");
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<SignalingMessage>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();

        let writer = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!(
                            target: "signaling",
                            id = message.id(),
                            "failed to encode outbound message: {err}"
                        );
                        continue;
                    }
                };
                if ws_write.send(Message::Text(text)).await.is_err() {
                    tracing::debug!(target: "signaling", "websocket writer stopped");
                    break;
                }
            }
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = ws_read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if inbound_tx.send(text).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Binary(data)) => match String::from_utf8(data) {
                        Ok(text) => {
                            if inbound_tx.send(text).is_err() {
                                break;
                            }
                        }
                        Err(_) => {
                            tracing::warn!(target: "signaling", "dropping non-utf8 binary frame")
                        }
                    },
                    Ok(Message::Close(_)) => {
                        tracing::debug!(target: "signaling", "websocket closed by server");
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        match &err {
                            WsError::ConnectionClosed
                            | WsError::AlreadyClosed
                            | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
                                tracing::debug!(target: "signaling", "websocket closed: {err}");
                            }
                            _ => {
                                tracing::warn!(target: "signaling", "websocket error: {err}");
                            }
                        }
                        break;
                    }
                }
            }
        });

        let channel = Arc::new(WebSocketSignaling {
            outbound_tx,
            tasks: Mutex::new(vec![writer, reader]),
        });
        Ok((channel, inbound_rx))
    }

    /// Tear the connection down. Safe to call repeatedly.
    pub fn close(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for handle in tasks.drain(..) {
                handle.abort();
            }
        }
    }
}

impl MessageSender for WebSocketSignaling {
    fn send(&self, message: SignalingMessage) {
        let id = message.id();
        if self.outbound_tx.send(message).is_err() {
            tracing::warn!(target: "signaling", id, "{}", TransportError::ChannelUnavailable);
        }
    }
}

impl Drop for WebSocketSignaling {
    fn drop(&mut self) {
        self.close();
    }
}

/// Derive the websocket endpoint from the configured server base URL and the
/// variant path. `http(s)` schemes are rewritten to `ws(s)`.
pub fn endpoint_url(server: &str, path: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(server)
        .map_err(|err| TransportError::Setup(format!("invalid signaling url {server}: {err}")))?;
    let scheme = match url.scheme() {
        "ws" | "wss" => None,
        "http" => Some("ws"),
        "https" => Some("wss"),
        other => {
            return Err(TransportError::Setup(format!(
                "unsupported signaling scheme `{other}`"
            )))
        }
    };
    if let Some(scheme) = scheme {
        url.set_scheme(scheme)
            .map_err(|_| TransportError::Setup("invalid websocket scheme".into()))?;
    }
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_ws_endpoint_from_http() {
        let url = endpoint_url("http://media.example:8000", "/ws/loopback/").unwrap();
        assert_eq!(url.as_str(), "ws://media.example:8000/ws/loopback/");
    }

    #[test]
    fn keeps_ws_scheme_and_replaces_path() {
        let url = endpoint_url("ws://127.0.0.1:8000/ignored?x=1", "/ws/rtsp/").unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8000/ws/rtsp/");
    }

    #[test]
    fn upgrades_https_to_wss() {
        let url = endpoint_url("https://media.example", "/ws/loopback/").unwrap();
        assert_eq!(url.scheme(), "wss");
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let err = endpoint_url("ftp://media.example", "/ws/loopback/").unwrap_err();
        assert!(matches!(err, TransportError::Setup(_)));
    }
}
