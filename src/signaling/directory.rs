//! Room membership directory
//!
//! Tracks which connection sits in which room. Rooms exist only while they
//! have members: the first join creates one and the last leave removes it.

use std::collections::HashMap;

use super::error::SignalingError;
use super::peer::{ConnectionId, Peer};

/// Directory of joined peers, grouped by room
#[derive(Debug, Default)]
pub struct PeerDirectory {
    /// Room id to member ids, in join order
    rooms: HashMap<String, Vec<ConnectionId>>,
    /// Joined peers by connection id
    peers: HashMap<ConnectionId, Peer>,
}

impl PeerDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer to its room
    ///
    /// Returns the members that were already in the room, in join order. A
    /// connection joins at most once; a second join is rejected and leaves
    /// the directory untouched.
    pub fn join(&mut self, peer: Peer) -> Result<Vec<Peer>, SignalingError> {
        if let Some(existing) = self.peers.get(&peer.id) {
            return Err(SignalingError::AlreadyJoined {
                room: existing.room.clone(),
            });
        }

        let members = self.rooms.entry(peer.room.clone()).or_default();
        let existing: Vec<Peer> = members
            .iter()
            .filter_map(|id| self.peers.get(id).cloned())
            .collect();

        members.push(peer.id.clone());
        self.peers.insert(peer.id.clone(), peer);

        Ok(existing)
    }

    /// Remove a peer from its room
    ///
    /// Returns the removed peer and the members still in the room, or `None`
    /// if the connection never joined.
    pub fn leave(&mut self, id: &ConnectionId) -> Option<(Peer, Vec<ConnectionId>)> {
        let peer = self.peers.remove(id)?;

        let remaining = match self.rooms.get_mut(&peer.room) {
            Some(members) => {
                members.retain(|member| member != id);
                members.clone()
            }
            None => Vec::new(),
        };

        if remaining.is_empty() {
            self.rooms.remove(&peer.room);
        }

        Some((peer, remaining))
    }

    /// Get a joined peer
    pub fn peer(&self, id: &ConnectionId) -> Option<&Peer> {
        self.peers.get(id)
    }

    /// Members of a room, in join order
    pub fn members(&self, room: &str) -> Vec<&Peer> {
        self.rooms
            .get(room)
            .map(|ids| ids.iter().filter_map(|id| self.peers.get(id)).collect())
            .unwrap_or_default()
    }

    /// Number of rooms with at least one member
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of joined peers across all rooms
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(id: &str, room: &str) -> Peer {
        Peer::new(id.into(), room, Some(id.to_uppercase()))
    }

    #[test]
    fn test_join_returns_existing_members() {
        let mut directory = PeerDirectory::new();

        assert!(directory.join(peer("a", "r1")).unwrap().is_empty());
        let existing = directory.join(peer("b", "r1")).unwrap();
        assert_eq!(existing, vec![peer("a", "r1")]);

        let existing = directory.join(peer("c", "r1")).unwrap();
        let ids: Vec<_> = existing.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_rooms_are_isolated() {
        let mut directory = PeerDirectory::new();

        directory.join(peer("a", "r1")).unwrap();
        let existing = directory.join(peer("b", "r2")).unwrap();

        assert!(existing.is_empty());
        assert_eq!(directory.room_count(), 2);
    }

    #[test]
    fn test_rejoin_rejected() {
        let mut directory = PeerDirectory::new();
        directory.join(peer("a", "r1")).unwrap();

        let result = directory.join(peer("a", "r2"));
        assert_eq!(
            result,
            Err(SignalingError::AlreadyJoined { room: "r1".into() })
        );
        assert_eq!(directory.peer(&"a".into()).unwrap().room, "r1");
        assert!(directory.members("r2").is_empty());
    }

    #[test]
    fn test_leave() {
        let mut directory = PeerDirectory::new();
        directory.join(peer("a", "r1")).unwrap();
        directory.join(peer("b", "r1")).unwrap();

        let (removed, remaining) = directory.leave(&"a".into()).unwrap();
        assert_eq!(removed.id.as_str(), "a");
        assert_eq!(remaining, vec![ConnectionId::from("b")]);
        assert!(directory.peer(&"a".into()).is_none());
        assert_eq!(directory.members("r1").len(), 1);
    }

    #[test]
    fn test_empty_room_removed() {
        let mut directory = PeerDirectory::new();
        directory.join(peer("a", "r1")).unwrap();

        let (_, remaining) = directory.leave(&"a".into()).unwrap();
        assert!(remaining.is_empty());
        assert_eq!(directory.room_count(), 0);
        assert_eq!(directory.peer_count(), 0);
    }

    #[test]
    fn test_leave_without_join() {
        let mut directory = PeerDirectory::new();
        assert!(directory.leave(&"ghost".into()).is_none());
    }
}
