//! Crate-level error type

use crate::camera::CameraError;
use crate::signaling::SignalingError;
use crate::stream::StreamError;

/// Result alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for camrelay operations
#[derive(Debug)]
pub enum Error {
    /// I/O error (bind, accept, serve)
    Io(std::io::Error),
    /// Camera registration or lookup failed
    Camera(CameraError),
    /// Signaling message was rejected
    Signaling(SignalingError),
    /// Camera stream could not be opened
    Stream(StreamError),
    /// Invalid configuration
    Config(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Camera(e) => write!(f, "Camera error: {}", e),
            Error::Signaling(e) => write!(f, "Signaling error: {}", e),
            Error::Stream(e) => write!(f, "Stream error: {}", e),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Camera(e) => Some(e),
            Error::Signaling(e) => Some(e),
            Error::Stream(e) => Some(e),
            Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<CameraError> for Error {
    fn from(e: CameraError) -> Self {
        Error::Camera(e)
    }
}

impl From<SignalingError> for Error {
    fn from(e: SignalingError) -> Self {
        Error::Signaling(e)
    }
}

impl From<StreamError> for Error {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Camera(e) => Error::Camera(e),
            other => Error::Stream(other),
        }
    }
}
