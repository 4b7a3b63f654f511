//! Wire protocol spoken over the signaling channel.
//!
//! Every frame is a UTF-8 JSON object with a mandatory `id` field selecting
//! the variant and a variant-specific `payload`. SDP and candidate payloads
//! are opaque to this layer and pass through unchanged between the server
//! and the peer engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "id", content = "payload")]
pub enum SignalingMessage {
    /// Local SDP offer submitted for processing (client -> server).
    #[serde(rename = "processOffer")]
    ProcessOffer(String),
    /// Remote SDP answer for the outstanding offer (server -> client).
    #[serde(rename = "sdpAnswer")]
    SdpAnswer(String),
    /// Locally discovered ICE candidate (client -> server).
    #[serde(rename = "addIce")]
    AddIce(IceCandidateBlob),
    /// Remotely discovered ICE candidate (server -> client).
    #[serde(rename = "iceCandidate")]
    IceCandidate(IceCandidateBlob),
    /// Session teardown notification (client -> server).
    #[serde(rename = "stop")]
    Stop,
    /// Human-readable diagnostic (either direction).
    #[serde(rename = "error")]
    Error(String),
    /// Informational payload, logged only (server -> client).
    #[serde(rename = "info")]
    Info(Value),
    /// One-shot ingest source announcement (client -> server).
    #[serde(rename = "rtspURL")]
    RtspUrl(String),
    /// Ingest source connection status, logged only (server -> client).
    #[serde(rename = "rtspConnection")]
    RtspConnection(Value),
}

impl SignalingMessage {
    pub fn id(&self) -> &'static str {
        match self {
            SignalingMessage::ProcessOffer(_) => "processOffer",
            SignalingMessage::SdpAnswer(_) => "sdpAnswer",
            SignalingMessage::AddIce(_) => "addIce",
            SignalingMessage::IceCandidate(_) => "iceCandidate",
            SignalingMessage::Stop => "stop",
            SignalingMessage::Error(_) => "error",
            SignalingMessage::Info(_) => "info",
            SignalingMessage::RtspUrl(_) => "rtspURL",
            SignalingMessage::RtspConnection(_) => "rtspConnection",
        }
    }
}

/// ICE candidate descriptor in the browser JSON shape. Unknown fields are
/// tolerated so newer peers can extend the blob without breaking us.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IceCandidateBlob {
    pub candidate: String,
    #[serde(rename = "sdpMid", default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_mline_index: Option<u16>,
}

const KNOWN_IDS: &[&str] = &[
    "processOffer",
    "sdpAnswer",
    "addIce",
    "iceCandidate",
    "stop",
    "error",
    "info",
    "rtspURL",
    "rtspConnection",
];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame has no string `id` field")]
    MissingId,
    #[error("unrecognized message id `{id}`")]
    UnknownId { id: String },
    #[error("malformed `{id}` payload: {source}")]
    Payload {
        id: String,
        source: serde_json::Error,
    },
}

/// Decode one inbound frame. Unknown ids are reported distinctly from
/// malformed payloads so the router can keep forward-compatible frames
/// inert instead of treating them as protocol violations.
pub fn decode(frame: &str) -> Result<SignalingMessage, DecodeError> {
    let value: Value = serde_json::from_str(frame)?;
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingId)?
        .to_string();
    if !KNOWN_IDS.contains(&id.as_str()) {
        return Err(DecodeError::UnknownId { id });
    }
    serde_json::from_value(value).map_err(|source| DecodeError::Payload { id, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn offer_serializes_with_id_and_payload() {
        let message = SignalingMessage::ProcessOffer("v=0 fake sdp".into());
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value, json!({"id": "processOffer", "payload": "v=0 fake sdp"}));
    }

    #[test]
    fn stop_carries_no_payload() {
        let value = serde_json::to_value(SignalingMessage::Stop).unwrap();
        assert_eq!(value, json!({"id": "stop"}));
    }

    #[test]
    fn candidate_blob_uses_browser_field_names() {
        let message = SignalingMessage::AddIce(IceCandidateBlob {
            candidate: "candidate:1 1 udp 2113937151 192.0.2.1 54400 typ host".into(),
            sdp_mid: Some("0".into()),
            sdp_mline_index: Some(0),
        });
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["payload"]["sdpMid"], json!("0"));
        assert_eq!(value["payload"]["sdpMLineIndex"], json!(0));
    }

    #[test]
    fn decodes_answer_frame() {
        let message = decode(r#"{"id":"sdpAnswer","payload":"v=0 answer"}"#).unwrap();
        assert_eq!(message, SignalingMessage::SdpAnswer("v=0 answer".into()));
    }

    #[test]
    fn decodes_candidate_with_extra_fields() {
        let frame = r#"{"id":"iceCandidate","payload":{"candidate":"candidate:1","sdpMid":"0","sdpMLineIndex":0,"usernameFragment":"abcd"}}"#;
        let message = decode(frame).unwrap();
        match message {
            SignalingMessage::IceCandidate(blob) => {
                assert_eq!(blob.sdp_mid.as_deref(), Some("0"))
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_id_is_distinguished() {
        let err = decode(r#"{"id":"serverShutdown","payload":1}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownId { id } if id == "serverShutdown"));
    }

    #[test]
    fn missing_id_is_rejected() {
        let err = decode(r#"{"payload":"x"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingId));
    }

    #[test]
    fn known_id_with_bad_payload_is_malformed() {
        let err = decode(r#"{"id":"sdpAnswer","payload":42}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Payload { id, .. } if id == "sdpAnswer"));
    }

    #[test]
    fn garbage_frame_is_rejected() {
        assert!(matches!(decode("not json"), Err(DecodeError::Json(_))));
    }
}
