//! Signaling relay
//!
//! Turns one client event into directory updates plus the list of messages
//! to deliver. Nothing here touches a socket, so the whole protocol can be
//! exercised against a bare [`PeerDirectory`].
//!
//! ```text
//!   (event, directory) ──► relay ──► (directory', [Outbound { to, message }])
//! ```

use std::collections::BTreeMap;

use super::directory::PeerDirectory;
use super::error::SignalingError;
use super::message::{ClientMessage, JoinRoom, ServerMessage};
use super::peer::{ConnectionId, Peer};

/// A message addressed to one connection
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    /// Recipient connection
    pub to: ConnectionId,
    /// Message to deliver
    pub message: ServerMessage,
}

impl Outbound {
    fn new(to: ConnectionId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

/// Apply a client event from connection `from`
///
/// `camera_ids` is the current camera list, sent to a peer when it joins.
pub fn handle(
    directory: &mut PeerDirectory,
    from: &ConnectionId,
    message: ClientMessage,
    camera_ids: &[String],
) -> Result<Vec<Outbound>, SignalingError> {
    match message {
        ClientMessage::JoinRoom(join) => handle_join(directory, from, join, camera_ids),
        ClientMessage::Offer { target, offer } => {
            let sender = joined(directory, from)?;
            Ok(vec![Outbound::new(
                target.into(),
                ServerMessage::Offer {
                    caller: from.to_string(),
                    offer,
                    user_name: sender.name.clone(),
                },
            )])
        }
        ClientMessage::Answer { target, answer } => {
            joined(directory, from)?;
            Ok(vec![Outbound::new(
                target.into(),
                ServerMessage::Answer {
                    caller: from.to_string(),
                    answer,
                },
            )])
        }
        ClientMessage::IceCandidate { target, candidate } => {
            joined(directory, from)?;
            Ok(vec![Outbound::new(
                target.into(),
                ServerMessage::IceCandidate {
                    from: from.to_string(),
                    candidate,
                },
            )])
        }
    }
}

/// Remove a connection from its room and notify the remaining members
///
/// Returns no messages if the connection never joined.
pub fn disconnect(directory: &mut PeerDirectory, id: &ConnectionId) -> Vec<Outbound> {
    let Some((peer, remaining)) = directory.leave(id) else {
        return Vec::new();
    };

    tracing::info!(peer = %peer.id, room = %peer.room, "Peer left room");

    remaining
        .into_iter()
        .map(|member| Outbound::new(member, ServerMessage::UserDisconnected(id.to_string())))
        .collect()
}

fn handle_join(
    directory: &mut PeerDirectory,
    from: &ConnectionId,
    join: JoinRoom,
    camera_ids: &[String],
) -> Result<Vec<Outbound>, SignalingError> {
    let peer = Peer::new(from.clone(), join.room_id, join.user_name);
    let existing = directory.join(peer.clone())?;

    tracing::info!(
        peer = %peer.id,
        room = %peer.room,
        user_name = %peer.name,
        existing_peers = existing.len(),
        "Peer joined room"
    );

    let peer_list: BTreeMap<String, String> = existing
        .iter()
        .map(|p| (p.id.to_string(), p.name.clone()))
        .collect();

    let mut outbound = Vec::with_capacity(3 + existing.len() * 2);

    outbound.push(Outbound::new(from.clone(), ServerMessage::PeerList(peer_list)));
    outbound.push(Outbound::new(
        from.clone(),
        ServerMessage::CameraList(camera_ids.to_vec()),
    ));
    outbound.push(Outbound::new(
        from.clone(),
        ServerMessage::NewUser {
            existing_peers: existing.iter().map(|p| p.id.to_string()).collect(),
        },
    ));

    // Announce the joiner to the room
    for member in &existing {
        outbound.push(Outbound::new(
            member.id.clone(),
            ServerMessage::UserConnected {
                socket_id: peer.id.to_string(),
                user_name: peer.name.clone(),
            },
        ));
    }

    // And every member to the joiner, so either side may start negotiating
    for member in &existing {
        outbound.push(Outbound::new(
            from.clone(),
            ServerMessage::UserConnected {
                socket_id: member.id.to_string(),
                user_name: member.name.clone(),
            },
        ));
    }

    Ok(outbound)
}

fn joined<'a>(directory: &'a PeerDirectory, id: &ConnectionId) -> Result<&'a Peer, SignalingError> {
    directory.peer(id).ok_or(SignalingError::NotJoined)
}
