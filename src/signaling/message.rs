//! Signaling wire messages
//!
//! Every WebSocket text frame carries one JSON object of the form
//! `{"event": "<name>", "data": <payload>}`. Negotiation payloads (SDP
//! offers and answers, ICE candidates) are opaque and forwarded verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::SignalingError;

/// Message sent by a browser peer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Join a room
    JoinRoom(JoinRoom),
    /// SDP offer for `target`
    Offer {
        target: String,
        offer: Value,
    },
    /// SDP answer for `target`
    Answer {
        target: String,
        answer: Value,
    },
    /// ICE candidate for `target`
    IceCandidate {
        target: String,
        candidate: Value,
    },
}

impl ClientMessage {
    /// Decode a text frame
    pub fn parse(text: &str) -> Result<Self, SignalingError> {
        serde_json::from_str(text).map_err(|e| SignalingError::MalformedMessage(e.to_string()))
    }

    /// Event name, for logging
    pub fn event(&self) -> &'static str {
        match self {
            ClientMessage::JoinRoom(_) => "join-room",
            ClientMessage::Offer { .. } => "offer",
            ClientMessage::Answer { .. } => "answer",
            ClientMessage::IceCandidate { .. } => "ice-candidate",
        }
    }
}

/// Payload of a `join-room` event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    /// Room to join
    pub room_id: String,
    /// Display name
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Message sent to a browser peer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Other members of the joined room, id to display name
    PeerList(BTreeMap<String, String>),
    /// All registered camera ids
    CameraList(Vec<String>),
    /// Peers the joiner should initiate negotiation toward
    NewUser { existing_peers: Vec<String> },
    /// A peer is present in the room
    UserConnected { socket_id: String, user_name: String },
    /// A peer left the room
    UserDisconnected(String),
    /// Forwarded SDP offer
    Offer {
        caller: String,
        offer: Value,
        user_name: String,
    },
    /// Forwarded SDP answer
    Answer { caller: String, answer: Value },
    /// Forwarded ICE candidate
    IceCandidate { from: String, candidate: Value },
}

impl ServerMessage {
    /// Encode as a text frame
    pub fn to_json(&self) -> String {
        // Serializing string keys and JSON values cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Event name, for logging
    pub fn event(&self) -> &'static str {
        match self {
            ServerMessage::PeerList(_) => "peer-list",
            ServerMessage::CameraList(_) => "camera-list",
            ServerMessage::NewUser { .. } => "new-user",
            ServerMessage::UserConnected { .. } => "user-connected",
            ServerMessage::UserDisconnected(_) => "user-disconnected",
            ServerMessage::Offer { .. } => "offer",
            ServerMessage::Answer { .. } => "answer",
            ServerMessage::IceCandidate { .. } => "ice-candidate",
        }
    }
}
