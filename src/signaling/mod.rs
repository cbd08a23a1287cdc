//! Room-scoped WebRTC signaling
//!
//! Browsers join a named room over a WebSocket, learn who else is there,
//! and exchange SDP offers/answers and ICE candidates addressed by
//! connection id. The server never looks inside negotiation payloads.
//!
//! # Connection lifecycle
//!
//! ```text
//!   connect ──► Connected ──join-room──► Joined(room) ──close──► Disconnected
//!                   │                                                 ▲
//!                   └──────────────────────close──────────────────────┘
//! ```
//!
//! A connection joins at most one room; a second `join-room` is rejected.
//! Negotiation messages are only relayed for joined connections.

pub mod connection;
pub mod directory;
pub mod error;
pub mod hub;
pub mod message;
pub mod peer;
pub mod relay;

pub use connection::serve_socket;
pub use directory::PeerDirectory;
pub use error::SignalingError;
pub use hub::{MessageReceiver, SignalingHub};
pub use message::{ClientMessage, JoinRoom, ServerMessage};
pub use peer::{ConnectionId, Peer, DEFAULT_PEER_NAME};
pub use relay::Outbound;
