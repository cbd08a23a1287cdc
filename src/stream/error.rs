//! Stream pipeline error types

use crate::camera::CameraError;

/// Error type for opening a camera stream
#[derive(Debug)]
pub enum StreamError {
    /// Camera lookup failed
    Camera(CameraError),
    /// Transcoder process could not be started
    Spawn {
        /// Binary that failed to launch
        program: String,
        /// Underlying OS error
        source: std::io::Error,
    },
    /// Transcoder started without a stdout pipe
    MissingStdout,
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::Camera(e) => write!(f, "{}", e),
            StreamError::Spawn { program, source } => {
                write!(f, "Failed to start transcoder '{}': {}", program, source)
            }
            StreamError::MissingStdout => write!(f, "Transcoder stdout not captured"),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Camera(e) => Some(e),
            StreamError::Spawn { source, .. } => Some(source),
            StreamError::MissingStdout => None,
        }
    }
}

impl From<CameraError> for StreamError {
    fn from(e: CameraError) -> Self {
        StreamError::Camera(e)
    }
}
