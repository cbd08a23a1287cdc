//! Frame boundary detection for MJPEG byte streams
//!
//! Only frame boundaries are located here; frame contents are never decoded.

pub mod extractor;

pub use extractor::{take_frame, FrameExtractor, Frames, END_MARKER, START_MARKER};
