//! In-memory record store for tests and embedding.
//!
//! Counts every read and write so callers can assert "no I/O happened", and
//! can be told to fail writes to simulate a full disk.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use marginalia_core::{Error, RecordStore, Result};

#[derive(Default)]
struct Inner {
    documents: Mutex<BTreeMap<String, Vec<u8>>>,
    failing_paths: Mutex<HashSet<String>>,
    fail_all_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// Shared in-memory record store. Clones see the same documents.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<Inner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without counting it as I/O.
    pub fn insert(&self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.documents().insert(path.into(), data.into());
    }

    /// Current content at `path`, without counting it as I/O.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.documents().get(path).cloned()
    }

    /// Parse the document at `path` as JSON.
    pub fn get_json(&self, path: &str) -> Option<serde_json::Value> {
        self.get(path)
            .and_then(|data| serde_json::from_slice(&data).ok())
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_all_writes.store(fail, Ordering::SeqCst);
    }

    /// Make writes to one specific path fail.
    pub fn fail_writes_to(&self, path: impl Into<String>) {
        self.lock_failing().insert(path.into());
    }

    pub fn read_count(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Reads plus attempted writes.
    pub fn io_count(&self) -> usize {
        self.read_count() + self.write_count()
    }

    fn documents(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.inner
            .documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_failing(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.inner
            .failing_paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.documents().get(path).cloned())
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_all_writes.load(Ordering::SeqCst) || self.lock_failing().contains(path)
        {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("simulated write failure: {}", path),
            )));
        }
        self.documents().insert(path.to_string(), data.to_vec());
        Ok(())
    }
}
