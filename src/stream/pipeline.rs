//! Per-viewer camera stream
//!
//! ```text
//!   transcoder stdout ──► pump_frames ──► FrameExtractor ──► encode_part ──► mpsc ──► HTTP body
//!                             ▲                                                │
//!                             └──────────── tx.closed() (viewer gone) ◄────────┘
//! ```
//!
//! The pump keeps reading stdout even when the viewer is slow: a part that
//! does not fit in the queue is dropped rather than stalling the transcoder.

use std::convert::Infallible;
use std::io;

use axum::body::Body;
use bytes::Bytes;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::ChildStdout;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::wrappers::ReceiverStream;

use super::config::TranscoderConfig;
use super::error::StreamError;
use super::multipart::encode_part;
use super::process::TranscoderProcess;
use crate::camera::{redact_locator, CameraRegistry};
use crate::frame::FrameExtractor;

/// Counters for one stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Parts handed to the viewer
    pub frames_sent: u64,
    /// Bytes of JPEG data handed to the viewer
    pub bytes_sent: u64,
    /// Frames dropped because the viewer queue was full
    pub frames_dropped: u64,
}

/// Why the pump stopped
#[derive(Debug)]
pub enum PumpEnd {
    /// The receiving side was dropped
    ViewerGone,
    /// The transcoder closed its stdout
    SourceEnded,
    /// Reading stdout failed
    ReadFailed(io::Error),
}

/// A live MJPEG stream for one viewer
///
/// Dropping it signals the pump, which then stops the transcoder.
#[derive(Debug)]
pub struct CameraStream {
    camera_id: String,
    parts: mpsc::Receiver<Bytes>,
}

impl CameraStream {
    /// Camera this stream belongs to
    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    /// Next encoded multipart chunk, `None` once the stream has ended
    pub async fn next_part(&mut self) -> Option<Bytes> {
        self.parts.recv().await
    }

    /// Convert into an unbounded HTTP response body
    pub fn into_body(self) -> Body {
        Body::from_stream(ReceiverStream::new(self.parts).map(Ok::<_, Infallible>))
    }
}

/// Start streaming a registered camera
///
/// Fails with [`StreamError::Camera`] if the id is unknown and with
/// [`StreamError::Spawn`] if the transcoder cannot be launched. Nothing has
/// been sent to the viewer in either case.
pub async fn open_stream(
    cameras: &CameraRegistry,
    camera_id: &str,
    config: &TranscoderConfig,
) -> Result<CameraStream, StreamError> {
    let locator = cameras.resolve(camera_id).await?;

    tracing::info!(
        camera_id,
        locator = %redact_locator(&locator),
        "Opening camera stream"
    );

    let (process, stdout) = TranscoderProcess::spawn(config, camera_id, &locator)?;
    Ok(attach(camera_id, process, stdout, config))
}

/// Wire a running transcoder to a new viewer queue
pub fn attach(
    camera_id: &str,
    process: TranscoderProcess,
    stdout: ChildStdout,
    config: &TranscoderConfig,
) -> CameraStream {
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));

    tokio::spawn(run_pipeline(
        camera_id.to_string(),
        process,
        stdout,
        tx,
        config.clone(),
    ));

    CameraStream {
        camera_id: camera_id.to_string(),
        parts: rx,
    }
}

async fn run_pipeline(
    camera_id: String,
    mut process: TranscoderProcess,
    stdout: ChildStdout,
    parts: mpsc::Sender<Bytes>,
    config: TranscoderConfig,
) {
    let mut extractor = FrameExtractor::with_max_size(config.max_frame_size);
    let (end, stats) = pump_frames(stdout, &mut extractor, &parts, config.read_buffer_size).await;

    // Ends the response body
    drop(parts);

    match end {
        PumpEnd::ViewerGone => {
            tracing::info!(camera_id = %camera_id, "Viewer disconnected, stopping transcoder");
            process.terminate();
        }
        PumpEnd::SourceEnded => {
            tracing::debug!(camera_id = %camera_id, "Transcoder output ended");
        }
        PumpEnd::ReadFailed(e) => {
            tracing::warn!(camera_id = %camera_id, error = %e, "Transcoder read failed");
            process.terminate();
        }
    }

    process.shutdown(config.kill_grace_period).await;

    tracing::info!(
        camera_id = %camera_id,
        frames = stats.frames_sent,
        bytes = stats.bytes_sent,
        dropped_frames = stats.frames_dropped,
        discarded_bytes = extractor.dropped_bytes(),
        "Camera stream closed"
    );
}

/// Move frames from `reader` to `parts` until either side goes away
///
/// Viewer disconnect is noticed even while `reader` is idle.
pub async fn pump_frames<R>(
    mut reader: R,
    extractor: &mut FrameExtractor,
    parts: &mpsc::Sender<Bytes>,
    read_buffer_size: usize,
) -> (PumpEnd, PumpStats)
where
    R: AsyncRead + Unpin,
{
    let mut stats = PumpStats::default();
    let mut chunk = vec![0u8; read_buffer_size.max(1)];

    loop {
        tokio::select! {
            biased;

            _ = parts.closed() => return (PumpEnd::ViewerGone, stats),

            read = reader.read(&mut chunk) => {
                let n = match read {
                    Ok(0) => return (PumpEnd::SourceEnded, stats),
                    Ok(n) => n,
                    Err(e) => return (PumpEnd::ReadFailed(e), stats),
                };

                for frame in extractor.feed(&chunk[..n]) {
                    match parts.try_send(encode_part(&frame)) {
                        Ok(()) => {
                            stats.frames_sent += 1;
                            stats.bytes_sent += frame.len() as u64;
                        }
                        Err(TrySendError::Full(_)) => {
                            stats.frames_dropped += 1;
                            tracing::trace!(size = frame.len(), "Viewer queue full, dropping frame");
                        }
                        Err(TrySendError::Closed(_)) => return (PumpEnd::ViewerGone, stats),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraError, CameraSource};
    use tokio::io::AsyncWriteExt;
    use tokio_test::io::Builder;

    const FRAME: [u8; 5] = [0xFF, 0xD8, b'A', 0xFF, 0xD9];

    #[tokio::test]
    async fn test_pump_split_frame() {
        let reader = Builder::new()
            .read(&[0x00, 0xFF, 0xD8, b'A'])
            .read(&[0xFF, 0xD9])
            .build();
        let (tx, mut rx) = mpsc::channel(8);
        let mut extractor = FrameExtractor::new();

        let (end, stats) = pump_frames(reader, &mut extractor, &tx, 1024).await;

        assert!(matches!(end, PumpEnd::SourceEnded));
        assert_eq!(stats.frames_sent, 1);
        assert_eq!(stats.bytes_sent, 5);
        assert_eq!(rx.recv().await.unwrap(), encode_part(&FRAME));
    }

    #[tokio::test]
    async fn test_pump_preserves_order() {
        let mut input = Vec::new();
        for marker in [b'1', b'2', b'3'] {
            input.extend_from_slice(&[0xFF, 0xD8, marker, 0xFF, 0xD9]);
        }
        let reader = Builder::new().read(&input).build();
        let (tx, mut rx) = mpsc::channel(8);
        let mut extractor = FrameExtractor::new();

        let (_, stats) = pump_frames(reader, &mut extractor, &tx, 1024).await;
        assert_eq!(stats.frames_sent, 3);

        for marker in [b'1', b'2', b'3'] {
            let expected = encode_part(&[0xFF, 0xD8, marker, 0xFF, 0xD9]);
            assert_eq!(rx.recv().await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_pump_drops_when_queue_full() {
        let mut input = Vec::new();
        for _ in 0..3 {
            input.extend_from_slice(&FRAME);
        }
        let reader = Builder::new().read(&input).build();
        let (tx, _rx) = mpsc::channel(1);
        let mut extractor = FrameExtractor::new();

        let (end, stats) = pump_frames(reader, &mut extractor, &tx, 1024).await;

        assert!(matches!(end, PumpEnd::SourceEnded));
        assert_eq!(stats.frames_sent, 1);
        assert_eq!(stats.frames_dropped, 2);
    }

    #[tokio::test]
    async fn test_pump_detects_viewer_gone_while_idle() {
        // Writer half stays open, so the reader never yields data or EOF
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, rx) = mpsc::channel(8);
        let mut extractor = FrameExtractor::new();

        let pump = tokio::spawn(async move {
            let result = pump_frames(reader, &mut extractor, &tx, 64).await;
            drop(tx);
            result
        });

        writer.write_all(&FRAME[..2]).await.unwrap();
        drop(rx);

        let (end, stats) = pump.await.unwrap();
        assert!(matches!(end, PumpEnd::ViewerGone));
        assert_eq!(stats.frames_sent, 0);
    }

    #[tokio::test]
    async fn test_pump_read_error() {
        let reader = Builder::new()
            .read(&FRAME)
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            .build();
        let (tx, _rx) = mpsc::channel(8);
        let mut extractor = FrameExtractor::new();

        let (end, stats) = pump_frames(reader, &mut extractor, &tx, 1024).await;

        assert!(matches!(end, PumpEnd::ReadFailed(_)));
        assert_eq!(stats.frames_sent, 1);
    }

    #[tokio::test]
    async fn test_open_stream_unknown_camera() {
        let cameras = CameraRegistry::new();
        let result = open_stream(&cameras, "missing", &TranscoderConfig::default()).await;

        assert!(matches!(
            result,
            Err(StreamError::Camera(CameraError::NotFound(id))) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn test_open_stream_spawn_failure() {
        let cameras = CameraRegistry::new();
        cameras
            .register(CameraSource::new("cam1", "rtsp://host/stream").unwrap())
            .await;
        let config = TranscoderConfig::default().program("/nonexistent/camrelay-ffmpeg");

        let result = open_stream(&cameras, "cam1", &config).await;
        assert!(matches!(result, Err(StreamError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_attach_streams_process_output() {
        let mut command = tokio::process::Command::new("printf");
        command.arg("\\377\\330A\\377\\331");
        let (process, stdout) =
            TranscoderProcess::spawn_command(command, "printf", "cam1").unwrap();

        let mut stream = attach("cam1", process, stdout, &TranscoderConfig::default());
        assert_eq!(stream.camera_id(), "cam1");

        assert_eq!(stream.next_part().await.unwrap(), encode_part(&FRAME));
        assert!(stream.next_part().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dropping_stream_stops_process() {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;
        use std::time::Duration;

        let mut command = tokio::process::Command::new("sleep");
        command.arg("30");
        let (process, stdout) =
            TranscoderProcess::spawn_command(command, "sleep", "cam1").unwrap();
        let pid = Pid::from_raw(process.id().unwrap() as i32);

        let stream = attach("cam1", process, stdout, &TranscoderConfig::default());
        assert!(kill(pid, None).is_ok());
        drop(stream);

        // The pipeline reaps the process after SIGTERM, so the pid disappears
        let gone = tokio::time::timeout(Duration::from_secs(5), async {
            while kill(pid, None).is_ok() {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        assert!(gone.is_ok(), "transcoder still running after viewer left");
    }
}
