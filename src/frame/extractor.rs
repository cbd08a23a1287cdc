//! Incremental JPEG frame extraction
//!
//! The transcoder writes a continuous MJPEG byte stream to stdout. Chunks are
//! appended to an accumulation buffer and complete frames are cut out of it:
//!
//! ```text
//!   buffer:  .. garbage .. | FF D8 .... FF D9 | FF D8 .... FF D9 | FF D8 ..
//!                          |<--- frame 1 --->|<--- frame 2 --->|<- pending
//! ```
//!
//! A frame runs from a start marker to the first end marker found after it,
//! both inclusive. Everything up to and including the end marker is dropped
//! from the buffer once the frame has been taken.

use bytes::{Buf, Bytes, BytesMut};

/// JPEG start-of-image marker
pub const START_MARKER: [u8; 2] = [0xFF, 0xD8];

/// JPEG end-of-image marker
pub const END_MARKER: [u8; 2] = [0xFF, 0xD9];

/// Default cap on a single pending frame (8MB)
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Take the first complete frame out of `buffer`
///
/// Returns `None` and leaves `buffer` untouched if no start marker followed
/// by an end marker is present. On success, every byte through the end
/// marker is removed from `buffer`, including any garbage that preceded the
/// start marker.
pub fn take_frame(buffer: &mut BytesMut) -> Option<Bytes> {
    let start = find_marker(buffer, &START_MARKER, 0)?;
    let end = find_marker(buffer, &END_MARKER, start)?;

    let consumed = buffer.split_to(end + END_MARKER.len()).freeze();
    Some(consumed.slice(start..))
}

fn find_marker(haystack: &[u8], marker: &[u8; 2], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(marker.len())
        .position(|window| window == marker)
        .map(|pos| pos + from)
}

/// Accumulating frame extractor
///
/// Owns the byte buffer of one stream. Besides [`take_frame`], it keeps memory
/// bounded: bytes that can never become part of a frame are discarded eagerly
/// and a pending frame larger than `max_size` is dropped.
#[derive(Debug)]
pub struct FrameExtractor {
    buffer: BytesMut,
    max_size: usize,
    dropped_bytes: u64,
}

impl FrameExtractor {
    /// Create an extractor with the default buffer limit
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_BUFFER_SIZE)
    }

    /// Create an extractor with a custom buffer limit
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            max_size,
            dropped_bytes: 0,
        }
    }

    /// Append a chunk and iterate over the frames it completes
    ///
    /// Frames are cut lazily as the iterator advances; anything not pulled
    /// stays buffered and is yielded after the next feed.
    pub fn feed(&mut self, chunk: &[u8]) -> Frames<'_> {
        self.buffer.extend_from_slice(chunk);
        Frames { extractor: self }
    }

    /// Number of bytes waiting for a frame to complete
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes discarded by the size limit
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped_bytes
    }

    fn next_frame(&mut self) -> Option<Bytes> {
        if let Some(frame) = take_frame(&mut self.buffer) {
            return Some(frame);
        }

        self.compact();
        None
    }

    /// Drop the bytes a later feed can never turn into a frame
    fn compact(&mut self) {
        match find_marker(&self.buffer, &START_MARKER, 0) {
            Some(start) => self.buffer.advance(start),
            None => {
                // A trailing 0xFF may be the first half of a start marker
                let keep = usize::from(self.buffer.last() == Some(&START_MARKER[0]));
                let garbage = self.buffer.len() - keep;
                self.buffer.advance(garbage);
            }
        }

        if self.buffer.len() > self.max_size {
            tracing::warn!(
                pending = self.buffer.len(),
                max_size = self.max_size,
                "Pending frame exceeds buffer limit, discarding"
            );
            self.dropped_bytes += self.buffer.len() as u64;
            self.buffer.clear();
        }
    }
}

impl Default for FrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames completed by one [`FrameExtractor::feed`] call
pub struct Frames<'a> {
    extractor: &'a mut FrameExtractor,
}

impl Iterator for Frames<'_> {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        self.extractor.next_frame()
    }
}
