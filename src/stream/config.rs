//! Transcoder configuration

use std::time::Duration;

use crate::frame::extractor::DEFAULT_MAX_BUFFER_SIZE;

/// Settings for the per-viewer transcoder process
#[derive(Debug, Clone)]
pub struct TranscoderConfig {
    /// Transcoder binary (looked up in `PATH` if not absolute)
    pub program: String,

    /// RTSP lower transport forced on the source connection
    pub rtsp_transport: String,

    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// MJPEG quality scale (2 = best, 31 = worst)
    pub quality: u8,

    /// Size of each read from the transcoder's stdout
    pub read_buffer_size: usize,

    /// Largest pending frame kept before the buffer is discarded
    pub max_frame_size: usize,

    /// Encoded parts queued per viewer
    ///
    /// A viewer that falls this far behind loses frames: new frames are
    /// dropped until the queue drains, so the transcoder is never stalled.
    pub channel_capacity: usize,

    /// Time allowed between the termination signal and a forced kill
    pub kill_grace_period: Duration,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            rtsp_transport: "tcp".to_string(),
            width: 1280,
            height: 720,
            quality: 3,
            read_buffer_size: 64 * 1024, // 64KB
            max_frame_size: DEFAULT_MAX_BUFFER_SIZE,
            channel_capacity: 8,
            kill_grace_period: Duration::from_secs(5),
        }
    }
}

impl TranscoderConfig {
    /// Set the transcoder binary
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the output resolution
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the MJPEG quality scale
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(2, 31);
        self
    }

    /// Set the per-viewer queue depth (slow viewers lose frames beyond it)
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Set the grace period before a forced kill
    pub fn kill_grace_period(mut self, grace: Duration) -> Self {
        self.kill_grace_period = grace;
        self
    }

    /// Command-line arguments for pulling `locator` as MJPEG on stdout
    pub fn args(&self, locator: &str) -> Vec<String> {
        vec![
            "-rtsp_transport".to_string(),
            self.rtsp_transport.clone(),
            "-i".to_string(),
            locator.to_string(),
            "-vf".to_string(),
            format!("scale={}:{}", self.width, self.height),
            "-f".to_string(),
            "mjpeg".to_string(),
            "-q".to_string(),
            self.quality.to_string(),
            "pipe:1".to_string(),
        ]
    }
}
