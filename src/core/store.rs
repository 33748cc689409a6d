//! Durable storage for the settings document.
//!
//! Stores hold exactly one JSON document and do no locking of their own. The
//! settings service serializes every write, so a store never sees two writes
//! in flight at once.

use crate::errors::{Error, Result};
use serde_json::Value;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Whole-document storage consumed by [`crate::core::settings::BotService`].
pub trait DocumentStore: Send + Sync {
    /// Reads the stored document.
    ///
    /// Fails with [`Error::NotFound`] when nothing has been stored yet and with
    /// [`Error::CorruptDocument`] when the stored bytes are not JSON.
    fn read(&self) -> impl Future<Output = Result<Value>> + Send;

    /// Replaces the stored document with `document`.
    fn write(&self, document: &Value) -> impl Future<Output = Result<()>> + Send;

    /// Creates whatever container the document lives in.
    fn ensure_directory(&self) -> impl Future<Output = Result<()>> + Send;
}

/// A JSON file on the local filesystem.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by the file at `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persistence_error(&self, source: std::io::Error) -> Error {
        Error::Persistence {
            path: self.path.clone(),
            source,
        }
    }
}

impl DocumentStore for JsonFileStore {
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn read(&self) -> Result<Value> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(e) => return Err(Error::Io(e)),
        };
        debug!("Read {} bytes of settings", bytes.len());
        serde_json::from_slice(&bytes).map_err(|source| Error::CorruptDocument {
            path: self.path.clone(),
            source,
        })
    }

    #[instrument(skip(self, document), fields(path = ?self.path))]
    async fn write(&self, document: &Value) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        let temp_path = self.temp_path();
        // Rename over the target so readers see the old or the new document, never half of one.
        tokio::fs::write(&temp_path, &bytes)
            .await
            .map_err(|e| self.persistence_error(e))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.persistence_error(e))?;
        debug!("Wrote {} bytes of settings", bytes.len());
        Ok(())
    }

    async fn ensure_directory(&self) -> Result<()> {
        let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| self.persistence_error(e))
    }
}
