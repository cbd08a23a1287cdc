//! Camera stream proxy
//!
//! Each viewer gets a dedicated transcoder process that pulls the camera's
//! RTSP feed and writes MJPEG to stdout. Frames are cut out of that byte
//! stream and sent to the viewer as `multipart/x-mixed-replace` parts.

pub mod config;
pub mod error;
pub mod multipart;
pub mod pipeline;
pub mod process;

pub use config::TranscoderConfig;
pub use error::StreamError;
pub use multipart::{encode_part, BOUNDARY, CONTENT_TYPE};
pub use pipeline::{attach, open_stream, pump_frames, CameraStream, PumpEnd, PumpStats};
pub use process::TranscoderProcess;
