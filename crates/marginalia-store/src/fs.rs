//! Filesystem record store.
//!
//! Documents live under a root directory at their relative path. Writes are
//! atomic (temp file + rename) so a crash mid-save never leaves a truncated
//! annotation record behind.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use marginalia_core::{Error, RecordStore, Result};

/// Record store backed by a directory tree.
#[derive(Debug, Clone)]
pub struct FsRecordStore {
    base_path: PathBuf,
}

impl FsRecordStore {
    /// Create a store rooted at `base_path`. The directory is created lazily.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(Error::InvalidInput(format!("invalid record path: {:?}", path)));
        }
        Ok(self.base_path.join(relative))
    }

    /// Check that records can be saved under the root before the first
    /// autosave needs to.
    ///
    /// Round-trips a scratch record through the same atomic write path as
    /// real saves. Any failure is a `Config` error naming the root.
    pub async fn check_writable(&self) -> Result<()> {
        const SCRATCH: &str = ".marginalia-check/record.json";
        const CONTENT: &[u8] = b"{\"check\":true}";

        let failed = |step: &str, e: Error| {
            Error::Config(format!(
                "data dir {} is not usable ({}): {}",
                self.base_path.display(),
                step,
                e.detail()
            ))
        };

        self.write(SCRATCH, CONTENT)
            .await
            .map_err(|e| failed("write", e))?;
        match self.read(SCRATCH).await.map_err(|e| failed("read", e))? {
            Some(data) if data == CONTENT => {}
            _ => return Err(failed("read", Error::Internal("read-back mismatch".to_string()))),
        }

        let scratch = self.full_path(SCRATCH)?;
        fs::remove_file(&scratch)
            .await
            .map_err(|e| failed("remove", e.into()))?;
        if let Some(dir) = scratch.parent() {
            let _ = fs::remove_dir(dir).await;
        }
        debug!(base_path = %self.base_path.display(), "record_store: root is writable");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FsRecordStore {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full_path = self.full_path(path)?;
        match fs::read(&full_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(record_path = %path, "record_store: missing, treating as empty");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path)?;
        debug!(record_path = %path, size = data.len(), "record_store: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "record_store: create_dir_all failed");
                e
            })?;
        }

        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "record_store: File::create failed");
            e
        })?;
        file.write_all(data).await.map_err(|e| {
            warn!(error = %e, "record_store: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "record_store: rename failed");
            e
        })?;

        Ok(())
    }
}
