//! Camera registry implementation

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::error::CameraError;
use super::locator::redact_locator;
use super::source::CameraSource;

/// Registry of known camera sources
///
/// Thread-safe via `RwLock`: registrations take the write lock, stream
/// requests and camera list snapshots share the read lock. Entries live for
/// the lifetime of the process.
pub struct CameraRegistry {
    /// Map of camera id to sanitized locator
    cameras: RwLock<HashMap<String, String>>,
}

impl CameraRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            cameras: RwLock::new(HashMap::new()),
        }
    }

    /// Register or overwrite a camera source
    ///
    /// Returns the sorted list of camera ids as of this registration, for
    /// broadcasting to signaling clients.
    pub async fn register(&self, source: CameraSource) -> Vec<String> {
        let mut cameras = self.cameras.write().await;

        let replaced = cameras.contains_key(&source.id);
        tracing::info!(
            camera_id = %source.id,
            locator = %redact_locator(&source.locator),
            replaced = replaced,
            "Camera source registered"
        );
        cameras.insert(source.id, source.locator);

        sorted_ids(&cameras)
    }

    /// Look up the locator for a camera
    pub async fn lookup(&self, camera_id: &str) -> Option<String> {
        self.cameras.read().await.get(camera_id).cloned()
    }

    /// Look up the locator for a camera, failing with `NotFound`
    pub async fn resolve(&self, camera_id: &str) -> Result<String, CameraError> {
        self.lookup(camera_id)
            .await
            .ok_or_else(|| CameraError::NotFound(camera_id.to_string()))
    }

    /// Snapshot of all registered camera ids, sorted
    pub async fn camera_ids(&self) -> Vec<String> {
        sorted_ids(&*self.cameras.read().await)
    }

    /// Number of registered cameras
    pub async fn len(&self) -> usize {
        self.cameras.read().await.len()
    }

    /// Whether no camera is registered
    pub async fn is_empty(&self) -> bool {
        self.cameras.read().await.is_empty()
    }
}

impl Default for CameraRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_ids(cameras: &HashMap<String, String>) -> Vec<String> {
    let mut ids: Vec<String> = cameras.keys().cloned().collect();
    ids.sort();
    ids
}
