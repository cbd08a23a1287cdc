//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::stream::TranscoderConfig;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3001;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Directory of static assets served at `/` (disabled if `None`)
    pub static_dir: Option<PathBuf>,

    /// Transcoder settings for camera streams
    pub transcoder: TranscoderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            static_dir: None,
            transcoder: TranscoderConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Build a config from `PORT`, `HOST`, `FFMPEG_PATH` and `STATIC_DIR`
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = non_empty(var("HOST")) {
            let ip: IpAddr = host
                .parse()
                .map_err(|_| Error::Config(format!("invalid HOST: {}", host)))?;
            config.bind_addr.set_ip(ip);
        }

        if let Some(port) = non_empty(var("PORT")) {
            let port: u16 = port
                .parse()
                .map_err(|_| Error::Config(format!("invalid PORT: {}", port)))?;
            config.bind_addr.set_port(port);
        }

        if let Some(program) = non_empty(var("FFMPEG_PATH")) {
            config.transcoder.program = program;
        }

        if let Some(dir) = non_empty(var("STATIC_DIR")) {
            config.static_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Serve static assets from `dir`
    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Set the transcoder binary
    pub fn ffmpeg_path(mut self, program: impl Into<String>) -> Self {
        self.transcoder.program = program.into();
        self
    }

    /// Replace the transcoder settings
    pub fn transcoder(mut self, transcoder: TranscoderConfig) -> Self {
        self.transcoder = transcoder;
        self
    }

    /// Set the per-viewer queue depth
    pub fn stream_channel_capacity(mut self, capacity: usize) -> Self {
        self.transcoder = self.transcoder.channel_capacity(capacity);
        self
    }

    /// Set the grace period before a transcoder is force-killed
    pub fn kill_grace_period(mut self, grace: Duration) -> Self {
        self.transcoder = self.transcoder.kill_grace_period(grace);
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
