//! Camera registry error types

/// Error type for camera registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Camera id or source locator missing, empty, or not a string
    InvalidRegistration,
    /// No camera registered under this id
    NotFound(String),
}

impl std::fmt::Display for CameraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraError::InvalidRegistration => write!(f, "Invalid cameraId or RTSP URL"),
            CameraError::NotFound(id) => write!(f, "Camera not found: {}", id),
        }
    }
}

impl std::error::Error for CameraError {}
