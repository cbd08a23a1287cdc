//! Signaling hub
//!
//! Owns the peer directory and the outbound queue of every live connection.
//!
//! ```text
//!   ws reader ──► hub.handle() ──► relay::handle() ──► [Outbound]
//!                     │                                    │
//!                     └── Mutex<HubState> ◄── deliver ─────┘
//!                                 │
//!                  mpsc::UnboundedSender per connection ──► ws writer
//! ```
//!
//! The directory update and the enqueueing of the resulting messages happen
//! under one lock, so every connection observes relay steps in the same
//! order. Socket writes happen outside the lock, in each connection's writer
//! task.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::camera::CameraRegistry;

use super::directory::PeerDirectory;
use super::error::SignalingError;
use super::message::{ClientMessage, ServerMessage};
use super::peer::ConnectionId;
use super::relay::{self, Outbound};

/// Receiving half of a connection's outbound queue
pub type MessageReceiver = mpsc::UnboundedReceiver<ServerMessage>;

#[derive(Default)]
struct HubState {
    directory: PeerDirectory,
    connections: HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
}

impl HubState {
    fn deliver(&self, outbound: Vec<Outbound>) {
        for Outbound { to, message } in outbound {
            match self.connections.get(&to) {
                Some(tx) => {
                    tracing::trace!(peer = %to, event = message.event(), "Queueing message");
                    if tx.send(message).is_err() {
                        tracing::debug!(peer = %to, "Connection closed, message dropped");
                    }
                }
                None => {
                    tracing::debug!(
                        peer = %to,
                        event = message.event(),
                        "Target not connected, message dropped"
                    );
                }
            }
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        for tx in self.connections.values() {
            let _ = tx.send(message.clone());
        }
    }
}

/// Shared signaling state for all connections
pub struct SignalingHub {
    state: Mutex<HubState>,
    cameras: Arc<CameraRegistry>,
}

impl SignalingHub {
    /// Create a hub that announces cameras from `cameras`
    pub fn new(cameras: Arc<CameraRegistry>) -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            cameras,
        }
    }

    /// Register a new connection
    ///
    /// Returns its id and the queue of messages to write to it.
    pub async fn connect(&self) -> (ConnectionId, MessageReceiver) {
        let id = ConnectionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut state = self.state.lock().await;
        state.connections.insert(id.clone(), tx);

        tracing::debug!(peer = %id, connections = state.connections.len(), "Connection opened");

        (id, rx)
    }

    /// Handle a message from a connection
    pub async fn handle(
        &self,
        from: &ConnectionId,
        message: ClientMessage,
    ) -> Result<(), SignalingError> {
        let event = message.event();
        let mut state = self.state.lock().await;

        // Read under the hub lock so a concurrent registration's broadcast
        // is always queued after this snapshot
        let camera_ids = match message {
            ClientMessage::JoinRoom(_) => self.cameras.camera_ids().await,
            _ => Vec::new(),
        };

        tracing::debug!(peer = %from, event = event, "Signaling message");

        let outbound = relay::handle(&mut state.directory, from, message, &camera_ids)?;
        state.deliver(outbound);
        Ok(())
    }

    /// Remove a connection and notify its room
    pub async fn disconnect(&self, id: &ConnectionId) {
        let mut state = self.state.lock().await;

        state.connections.remove(id);
        let outbound = relay::disconnect(&mut state.directory, id);
        state.deliver(outbound);

        tracing::debug!(peer = %id, connections = state.connections.len(), "Connection closed");
    }

    /// Send a message to every connection, joined or not
    pub async fn broadcast(&self, message: ServerMessage) {
        let state = self.state.lock().await;

        tracing::debug!(
            event = message.event(),
            connections = state.connections.len(),
            "Broadcasting"
        );
        state.broadcast(message);
    }

    /// Broadcast the current camera list to every connection
    ///
    /// The list is read under the hub lock, so the last announcement any
    /// connection receives reflects the latest registration.
    pub async fn announce_cameras(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let camera_ids = self.cameras.camera_ids().await;

        tracing::debug!(
            cameras = camera_ids.len(),
            connections = state.connections.len(),
            "Announcing camera list"
        );

        state.broadcast(ServerMessage::CameraList(camera_ids.clone()));
        camera_ids
    }

    /// Number of live connections
    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connections.len()
    }

    /// Number of connections that joined a room
    pub async fn peer_count(&self) -> usize {
        self.state.lock().await.directory.peer_count()
    }

    /// Number of rooms with members
    pub async fn room_count(&self) -> usize {
        self.state.lock().await.directory.room_count()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::camera::CameraSource;
    use crate::signaling::message::JoinRoom;

    fn join(room: &str, name: &str) -> ClientMessage {
        ClientMessage::JoinRoom(JoinRoom {
            room_id: room.into(),
            user_name: Some(name.into()),
        })
    }

    fn drain(rx: &mut MessageReceiver) -> Vec<ServerMessage> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn test_two_peers_join_and_leave() {
        let hub = SignalingHub::new(Arc::new(CameraRegistry::new()));
        let (a, mut rx_a) = hub.connect().await;
        let (b, mut rx_b) = hub.connect().await;

        hub.handle(&a, join("r1", "alice")).await.unwrap();
        drain(&mut rx_a);

        hub.handle(&b, join("r1", "bob")).await.unwrap();

        let to_b = drain(&mut rx_b);
        match &to_b[0] {
            ServerMessage::PeerList(peers) => {
                assert_eq!(peers.get(a.as_str()).map(String::as_str), Some("alice"));
            }
            other => panic!("expected peer-list, got {:?}", other),
        }

        assert_eq!(
            drain(&mut rx_a),
            vec![ServerMessage::UserConnected {
                socket_id: b.to_string(),
                user_name: "bob".into(),
            }]
        );

        hub.disconnect(&a).await;
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerMessage::UserDisconnected(a.to_string())]
        );
        assert_eq!(hub.peer_count().await, 1);
        assert_eq!(hub.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_offer_delivered_only_to_target() {
        let hub = SignalingHub::new(Arc::new(CameraRegistry::new()));
        let (a, mut rx_a) = hub.connect().await;
        let (b, mut rx_b) = hub.connect().await;
        let (c, mut rx_c) = hub.connect().await;

        for (id, name) in [(&a, "alice"), (&b, "bob"), (&c, "carol")] {
            hub.handle(id, join("r1", name)).await.unwrap();
        }
        drain(&mut rx_a);
        drain(&mut rx_b);
        drain(&mut rx_c);

        let offer = ClientMessage::Offer {
            target: b.to_string(),
            offer: json!({"sdp": "v=0"}),
        };
        hub.handle(&a, offer).await.unwrap();

        assert_eq!(
            drain(&mut rx_b),
            vec![ServerMessage::Offer {
                caller: a.to_string(),
                offer: json!({"sdp": "v=0"}),
                user_name: "alice".into(),
            }]
        );
        assert!(drain(&mut rx_a).is_empty());
        assert!(drain(&mut rx_c).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_target_dropped_silently() {
        let hub = SignalingHub::new(Arc::new(CameraRegistry::new()));
        let (a, mut rx_a) = hub.connect().await;
        hub.handle(&a, join("r1", "alice")).await.unwrap();
        drain(&mut rx_a);

        let candidate = ClientMessage::IceCandidate {
            target: "nobody".into(),
            candidate: json!({}),
        };
        assert!(hub.handle(&a, candidate).await.is_ok());
        assert!(drain(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn test_join_includes_camera_list() {
        let cameras = Arc::new(CameraRegistry::new());
        cameras
            .register(CameraSource::new("cam1", "rtsp://host/stream").unwrap())
            .await;

        let hub = SignalingHub::new(cameras);
        let (a, mut rx_a) = hub.connect().await;
        hub.handle(&a, join("r1", "alice")).await.unwrap();

        let messages = drain(&mut rx_a);
        assert_eq!(messages[1], ServerMessage::CameraList(vec!["cam1".into()]));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_unjoined_connections() {
        let hub = SignalingHub::new(Arc::new(CameraRegistry::new()));
        let (_a, mut rx_a) = hub.connect().await;
        let (b, mut rx_b) = hub.connect().await;
        hub.handle(&b, join("r1", "bob")).await.unwrap();
        drain(&mut rx_b);

        hub.broadcast(ServerMessage::CameraList(vec!["cam1".into()]))
            .await;

        assert_eq!(
            drain(&mut rx_a),
            vec![ServerMessage::CameraList(vec!["cam1".into()])]
        );
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerMessage::CameraList(vec!["cam1".into()])]
        );
    }

    #[tokio::test]
    async fn test_disconnect_closes_queue() {
        let hub = SignalingHub::new(Arc::new(CameraRegistry::new()));
        let (a, mut rx_a) = hub.connect().await;

        hub.disconnect(&a).await;

        assert!(rx_a.recv().await.is_none());
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_announce_cameras_sends_sorted_list() {
        let cameras = Arc::new(CameraRegistry::new());
        let hub = SignalingHub::new(Arc::clone(&cameras));
        let (_a, mut rx_a) = hub.connect().await;

        for id in ["garage", "door"] {
            cameras
                .register(CameraSource::new(id, "rtsp://host/stream").unwrap())
                .await;
        }
        let announced = hub.announce_cameras().await;

        assert_eq!(announced, vec!["door".to_string(), "garage".to_string()]);
        assert_eq!(
            drain(&mut rx_a),
            vec![ServerMessage::CameraList(announced)]
        );
    }
}
