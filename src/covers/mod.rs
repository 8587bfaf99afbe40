// src/covers/mod.rs
//
// Cover artwork lifecycle.
//
// Works reference covers by local filename only. Incoming references may
// still be remote URLs (from source adapters) or already-local filenames
// (from the upload collaborator); `CoverManager::resolve` turns either into
// a stored filename before any catalog transaction opens. A failed download
// degrades to "no cover" and never aborts the surrounding operation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A reference the asset manager would download rather than pass through.
pub fn is_remote_reference(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Asset store capability: write bytes under a generated name, delete by
/// name, existence check. The catalog never touches paths directly.
pub trait CoverStore: Send + Sync {
    fn put(&self, name: &str, bytes: &[u8]) -> AppResult<()>;
    fn delete(&self, name: &str) -> AppResult<()>;
    fn exists(&self, name: &str) -> bool;
}

/// Filesystem-backed cover store rooted at one directory.
pub struct FsCoverStore {
    root: PathBuf,
}

impl FsCoverStore {
    pub fn new(root: PathBuf) -> AppResult<Self> {
        std::fs::create_dir_all(&root).map_err(AppError::Io)?;
        Ok(Self { root })
    }

    /// Default store location: {APP_DATA}/mangavault/covers
    pub fn default_dir() -> AppResult<PathBuf> {
        let app_data_dir = dirs::data_dir()
            .ok_or_else(|| AppError::Other("Could not determine app data directory".to_string()))?;
        Ok(app_data_dir.join("mangavault").join("covers"))
    }
}

impl CoverStore for FsCoverStore {
    fn put(&self, name: &str, bytes: &[u8]) -> AppResult<()> {
        std::fs::write(self.root.join(name), bytes).map_err(AppError::Io)
    }

    fn delete(&self, name: &str) -> AppResult<()> {
        std::fs::remove_file(self.root.join(name)).map_err(AppError::Io)
    }

    fn exists(&self, name: &str) -> bool {
        self.root.join(name).exists()
    }
}

pub struct CoverManager {
    store: Arc<dyn CoverStore>,
    http_client: Client,
}

impl CoverManager {
    pub fn new(store: Arc<dyn CoverStore>) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { store, http_client }
    }

    /// Resolve an incoming cover reference to a stored filename.
    ///
    /// - absent/empty input: `None`, no side effect
    /// - http(s) URL: download and persist under a fresh `{uuid}.jpg` name;
    ///   a failure is logged and absorbed as `None`
    /// - anything else: treated as an already-local filename, passed through
    pub async fn resolve(&self, reference: Option<&str>) -> Option<String> {
        let reference = match reference {
            Some(r) if !r.is_empty() => r,
            _ => return None,
        };

        if is_remote_reference(reference) {
            match self.download(reference).await {
                Ok(filename) => Some(filename),
                Err(e) => {
                    log::warn!("Failed to download cover image from {}: {}", reference, e);
                    None
                }
            }
        } else {
            Some(reference.to_string())
        }
    }

    /// Delete a stored cover if present. Called when a work's cover changes
    /// away from its previous value and when a work is deleted.
    pub fn release(&self, filename: &str) {
        if !self.store.exists(filename) {
            return;
        }
        if let Err(e) = self.store.delete(filename) {
            log::warn!("Failed to remove cover image file {}: {}", filename, e);
        }
    }

    async fn download(&self, url: &str) -> AppResult<String> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Other(format!("Cover request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Other(format!("Cover request failed: {}", e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Other(format!("Cover body read failed: {}", e)))?;

        let filename = format!("{}.jpg", Uuid::new_v4());
        self.store.put(&filename, &bytes)?;
        Ok(filename)
    }
}
