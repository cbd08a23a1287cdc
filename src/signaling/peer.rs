//! Peer identity types

use serde::{Deserialize, Serialize};

/// Display name used when a client joins without one
pub const DEFAULT_PEER_NAME: &str = "Peer";

/// Identifier of one live signaling connection
///
/// Assigned by the server on connect and exposed to clients as `socketId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh random connection id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Borrow the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the wire representation
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A connection that has joined a room
///
/// Room and name are fixed at join time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Connection id
    pub id: ConnectionId,
    /// Client-supplied display name (may collide with other peers)
    pub name: String,
    /// Room the peer joined
    pub room: String,
}

impl Peer {
    /// Create a peer, substituting the default name for a missing or empty one
    pub fn new(id: ConnectionId, room: impl Into<String>, name: Option<String>) -> Self {
        let name = name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_PEER_NAME.to_string());

        Self {
            id,
            name,
            room: room.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_unique() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_default_name() {
        let peer = Peer::new("a".into(), "r1", None);
        assert_eq!(peer.name, DEFAULT_PEER_NAME);

        let peer = Peer::new("a".into(), "r1", Some(String::new()));
        assert_eq!(peer.name, DEFAULT_PEER_NAME);

        let peer = Peer::new("a".into(), "r1", Some("alice".into()));
        assert_eq!(peer.name, "alice");
    }
}
