//! camrelay: WebRTC room signaling and RTSP-to-MJPEG camera proxy
//!
//! Two independent services behind one HTTP server:
//!
//! - **Signaling**: browsers join named rooms over a WebSocket and exchange
//!   offers, answers and ICE candidates addressed by connection id.
//! - **Camera streams**: a camera is registered with an RTSP locator; each
//!   viewer of `/camera-stream` gets a dedicated `ffmpeg` process whose MJPEG
//!   output is cut into frames and sent as `multipart/x-mixed-replace`.
//!
//! # Architecture
//!
//! ```text
//!                       ┌──────────────────────────────┐
//!   POST /start-…  ───► │ CameraRegistry (RwLock)      │ ──camera-list──┐
//!                       └──────────────┬───────────────┘                │
//!                                      │ resolve                        ▼
//!   GET /camera-stream ──► open_stream ─► TranscoderProcess    SignalingHub (Mutex)
//!                                      │   stdout                ▲          │
//!                                      ▼                         │          ▼
//!                          FrameExtractor ─► multipart    GET /ws reader   ws writer
//! ```
//!
//! # Example
//!
//! ```no_run
//! use camrelay::{RelayServer, ServerConfig};
//!
//! # async fn run() -> camrelay::Result<()> {
//! let config = ServerConfig::from_env()?;
//! RelayServer::new(config).run().await
//! # }
//! ```

pub mod camera;
pub mod error;
pub mod frame;
pub mod server;
pub mod signaling;
pub mod stream;

pub use camera::{CameraError, CameraRegistry, CameraSource};
pub use error::{Error, Result};
pub use frame::FrameExtractor;
pub use server::{build_router, AppState, RelayServer, ServerConfig};
pub use signaling::{SignalingError, SignalingHub};
pub use stream::{StreamError, TranscoderConfig};
