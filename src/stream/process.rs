//! Transcoder subprocess ownership
//!
//! One process per viewer. The handle is owned by the pipeline task, so
//! termination always goes through [`TranscoderProcess::terminate`] and
//! [`TranscoderProcess::shutdown`]. `kill_on_drop` covers the case where the
//! task is aborted before either runs.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use super::config::TranscoderConfig;
use super::error::StreamError;

/// A running transcoder
#[derive(Debug)]
pub struct TranscoderProcess {
    camera_id: String,
    child: Child,
    terminated: bool,
}

impl TranscoderProcess {
    /// Launch the transcoder for `locator`
    ///
    /// Returns the process handle and its stdout. Fails if the binary cannot
    /// be executed.
    pub fn spawn(
        config: &TranscoderConfig,
        camera_id: &str,
        locator: &str,
    ) -> Result<(Self, ChildStdout), StreamError> {
        let mut command = Command::new(&config.program);
        command.args(config.args(locator));
        Self::spawn_command(command, &config.program, camera_id)
    }

    /// Launch an arbitrary command with the transcoder's stdio wiring
    pub fn spawn_command(
        mut command: Command,
        program: &str,
        camera_id: &str,
    ) -> Result<(Self, ChildStdout), StreamError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| StreamError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or(StreamError::MissingStdout)?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(camera_id.to_string(), stderr));
        }

        tracing::debug!(camera_id, pid = ?child.id(), program, "Transcoder started");

        Ok((
            Self {
                camera_id: camera_id.to_string(),
                child,
                terminated: false,
            },
            stdout,
        ))
    }

    /// OS process id, `None` once the process has been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Whether a termination signal has been sent
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Ask the process to exit
    ///
    /// Sends SIGTERM on unix and a hard kill elsewhere. Only the first call
    /// has any effect.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                    Ok(()) => {
                        tracing::debug!(camera_id = %self.camera_id, pid, "Sent SIGTERM to transcoder");
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(camera_id = %self.camera_id, pid, error = %e, "SIGTERM failed, killing");
                    }
                }
            }
        }

        if let Err(e) = self.child.start_kill() {
            tracing::debug!(camera_id = %self.camera_id, error = %e, "Transcoder already gone");
        }
    }

    /// Wait for the process to exit
    ///
    /// Escalates to a forced kill if it is still running after `grace`.
    /// Returns `None` if the exit status could not be collected.
    pub async fn shutdown(mut self, grace: Duration) -> Option<ExitStatus> {
        let status = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                tracing::warn!(camera_id = %self.camera_id, error = %e, "Failed to wait for transcoder");
                None
            }
            Err(_) => {
                tracing::warn!(
                    camera_id = %self.camera_id,
                    grace_ms = grace.as_millis() as u64,
                    "Transcoder did not exit in time, killing"
                );
                if let Err(e) = self.child.kill().await {
                    tracing::warn!(camera_id = %self.camera_id, error = %e, "Failed to kill transcoder");
                }
                self.child.wait().await.ok()
            }
        };

        if let Some(status) = status {
            log_exit(&self.camera_id, status, self.terminated);
        }
        status
    }
}

fn log_exit(camera_id: &str, status: ExitStatus, requested: bool) {
    if let Some(code) = status.code() {
        if status.success() || requested {
            tracing::info!(camera_id, code, "Transcoder exited");
        } else {
            tracing::warn!(camera_id, code, "Transcoder exited abnormally");
        }
        return;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            if requested {
                tracing::info!(camera_id, signal, "Transcoder terminated by signal");
            } else {
                tracing::warn!(camera_id, signal, "Transcoder killed by signal");
            }
            return;
        }
    }

    tracing::warn!(camera_id, status = %status, "Transcoder exited");
}

async fn forward_stderr(camera_id: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => tracing::debug!(camera_id = %camera_id, "ffmpeg: {}", line),
            Ok(None) => break,
            Err(e) => {
                tracing::trace!(camera_id = %camera_id, error = %e, "Transcoder stderr closed");
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_spawn_missing_binary() {
        let config = TranscoderConfig::default().program("/nonexistent/camrelay-ffmpeg");
        let result = TranscoderProcess::spawn(&config, "cam1", "rtsp://host/stream");

        assert!(matches!(result, Err(StreamError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let mut command = Command::new("sleep");
        command.arg("30");
        let (mut process, _stdout) =
            TranscoderProcess::spawn_command(command, "sleep", "cam1").unwrap();

        assert!(process.id().is_some());
        process.terminate();
        process.terminate();
        assert!(process.is_terminated());

        let status = process.shutdown(Duration::from_secs(5)).await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn test_stdout_is_piped() {
        let mut command = Command::new("printf");
        command.arg("frame");
        let (process, mut stdout) =
            TranscoderProcess::spawn_command(command, "printf", "cam1").unwrap();

        let mut output = Vec::new();
        stdout.read_to_end(&mut output).await.unwrap();
        assert_eq!(output, b"frame");

        let status = process.shutdown(Duration::from_secs(5)).await.unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_shutdown_kills_after_grace() {
        let mut command = Command::new("sleep");
        command.arg("30");
        let (process, _stdout) =
            TranscoderProcess::spawn_command(command, "sleep", "cam1").unwrap();

        // No terminate: the grace period expires and the process is killed
        let status = process.shutdown(Duration::from_millis(50)).await.unwrap();
        assert!(!status.success());
    }
}
