//! Camera source registry
//!
//! Maps client-assigned camera ids to the RTSP locator the transcoder pulls
//! from. Registration overwrites; entries are never removed.

pub mod error;
pub mod locator;
pub mod source;
pub mod store;

pub use error::CameraError;
pub use locator::{redact_locator, sanitize_locator};
pub use source::CameraSource;
pub use store::CameraRegistry;
