//! `multipart/x-mixed-replace` framing
//!
//! Browsers render each part of such a response in place of the previous
//! one, which turns a sequence of JPEGs into live video in an `<img>` tag.

use bytes::{Bytes, BytesMut};

/// Part boundary token
pub const BOUNDARY: &str = "ffserver";

/// Response content type
pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=ffserver";

/// Content type of each part
pub const PART_CONTENT_TYPE: &str = "image/jpeg";

/// Frame one JPEG as a body part
///
/// Produces `--ffserver\r\nContent-Type: image/jpeg\r\nContent-Length: <n>\r\n\r\n`
/// followed by the frame and a trailing CRLF, as a single chunk.
pub fn encode_part(frame: &[u8]) -> Bytes {
    let header = format!(
        "--{}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        BOUNDARY,
        PART_CONTENT_TYPE,
        frame.len()
    );

    let mut part = BytesMut::with_capacity(header.len() + frame.len() + 2);
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(frame);
    part.extend_from_slice(b"\r\n");
    part.freeze()
}
