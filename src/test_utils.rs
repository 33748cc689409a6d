//! Shared test utilities for the settings store.
//!
//! Every helper works against its own temporary directory so tests never share
//! a settings file.

#![allow(clippy::expect_used)]

use crate::{
    core::{
        document::BotSettings,
        settings::BotService,
        store::{DocumentStore, JsonFileStore},
    },
    errors::{Error, Result},
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber once per test binary.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates a service persisting to `<tempdir>/storage/bot.json`.
/// Keep the returned directory alive for as long as the service is used.
pub fn setup_test_service() -> (TempDir, BotService) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let service = BotService::new(dir.path().join("storage").join("bot.json"));
    (dir, service)
}

/// Writes `document` to `path` as-is, creating parent directories.
pub fn write_raw(path: &Path, document: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec(document)?)?;
    Ok(())
}

/// Parses the settings file at `path` strictly, without filling defaults.
pub fn read_persisted(path: &Path) -> Result<BotSettings> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// File store that records successful writes and can be told to fail them.
#[derive(Debug)]
pub struct RecordingStore {
    inner: JsonFileStore,
    /// Number of writes that reached the disk
    pub writes: AtomicUsize,
    /// When set, every write fails with [`Error::Persistence`]
    pub fail_writes: AtomicBool,
    /// Writes fail once this many have reached the disk
    pub fail_after: AtomicUsize,
    /// Every document that reached the disk, oldest first
    pub written: Mutex<Vec<Value>>,
}

impl RecordingStore {
    /// Recording store over the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: JsonFileStore::new(path),
            writes: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            fail_after: AtomicUsize::new(usize::MAX),
            written: Mutex::new(Vec::new()),
        }
    }

    /// Lets the next `count` writes through and fails the ones after.
    pub fn fail_after_next(&self, count: usize) {
        let done = self.writes.load(Ordering::SeqCst);
        self.fail_after.store(done + count, Ordering::SeqCst);
    }

    /// Documents written so far.
    pub fn written(&self) -> Vec<Value> {
        self.written.lock().expect("written log poisoned").clone()
    }
}

impl DocumentStore for RecordingStore {
    async fn read(&self) -> Result<Value> {
        self.inner.read().await
    }

    async fn write(&self, document: &Value) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst)
            || self.writes.load(Ordering::SeqCst) >= self.fail_after.load(Ordering::SeqCst)
        {
            return Err(Error::Persistence {
                path: self.inner.path().to_path_buf(),
                source: std::io::Error::other("injected write failure"),
            });
        }
        self.inner.write(document).await?;
        self.written
            .lock()
            .expect("written log poisoned")
            .push(document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ensure_directory(&self) -> Result<()> {
        self.inner.ensure_directory().await
    }
}
