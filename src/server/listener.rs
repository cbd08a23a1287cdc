//! HTTP server listener
//!
//! Binds the configured address and serves the router until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::camera::CameraRegistry;
use crate::error::Result;
use crate::server::config::ServerConfig;
use crate::server::routes::{build_router, AppState};
use crate::signaling::SignalingHub;

/// Camera relay server
pub struct RelayServer {
    state: AppState,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    /// Get a reference to the camera registry
    pub fn cameras(&self) -> &Arc<CameraRegistry> {
        &self.state.cameras
    }

    /// Get a reference to the signaling hub
    pub fn hub(&self) -> &Arc<SignalingHub> {
        &self.state.hub
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.state.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.bind_addr()).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            addr = %addr,
            static_dir = ?self.state.config.static_dir,
            ffmpeg = %self.state.config.transcoder.program,
            "Camera relay listening"
        );

        let router = build_router(self.state.clone());
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        let cameras = self.state.cameras.len().await;
        let connections = self.state.hub.connection_count().await;
        tracing::info!(cameras, connections, "Camera relay stopped");
        Ok(())
    }
}
