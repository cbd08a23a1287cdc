//! Signaling error types

/// Error type for signaling operations
///
/// None of these are reported to the client; the offending message is
/// logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingError {
    /// Connection already joined a room
    AlreadyJoined {
        /// Room the connection belongs to
        room: String,
    },
    /// Negotiation message from a connection that has not joined a room
    NotJoined,
    /// Frame could not be decoded as a client message
    MalformedMessage(String),
}

impl std::fmt::Display for SignalingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalingError::AlreadyJoined { room } => {
                write!(f, "Connection already joined room: {}", room)
            }
            SignalingError::NotJoined => write!(f, "Connection has not joined a room"),
            SignalingError::MalformedMessage(reason) => write!(f, "Malformed message: {}", reason),
        }
    }
}

impl std::error::Error for SignalingError {}
