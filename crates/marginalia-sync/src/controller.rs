//! Persistence controller: merges buffered edits into annotation records.
//!
//! A save walks the buffer snapshot in entity-id order. For each entity it
//! reads the stored record (missing means empty), applies the pending
//! values, writes the merged document, and then asks the overview generator
//! to regenerate that entity's overview. Regeneration failures are counted
//! and logged; a record failure aborts the save and leaves the buffer intact.
//!
//! Saves are serialized: an autosave and a manual sync never interleave.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use marginalia_core::{
    annotation_path, validate_segment, AnnotationRecord, EditableField, EngineConfig, Error,
    OverviewGenerator, RecordStore, Result,
};

use crate::buffer::{EditBuffer, EditSource, PendingChanges};
use crate::delayed::DelayedAction;
use crate::status::{SyncIndicator, SyncState};

/// Result of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The buffer was empty; nothing was read or written.
    AlreadySynced,
    Saved {
        entities: usize,
        overview_failures: usize,
    },
}

/// Timing knobs for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub autosave_debounce: Duration,
    pub saved_indicator: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for SyncConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            autosave_debounce: Duration::from_millis(config.autosave_debounce_ms),
            saved_indicator: Duration::from_millis(config.saved_indicator_ms),
        }
    }
}

struct ControllerInner {
    domain_id: String,
    store: Arc<dyn RecordStore>,
    overview: Arc<dyn OverviewGenerator>,
    buffer: EditBuffer,
    indicator: SyncIndicator,
    autosave: DelayedAction,
    autosave_debounce: Duration,
    save_lock: Mutex<()>,
}

/// Owns the edit buffer of one domain and persists it.
#[derive(Clone)]
pub struct PersistenceController {
    inner: Arc<ControllerInner>,
}

impl PersistenceController {
    pub fn new(
        domain_id: impl Into<String>,
        store: Arc<dyn RecordStore>,
        overview: Arc<dyn OverviewGenerator>,
        config: SyncConfig,
    ) -> Result<Self> {
        let domain_id = domain_id.into();
        validate_segment("domain id", &domain_id)?;

        Ok(Self {
            inner: Arc::new(ControllerInner {
                domain_id,
                store,
                overview,
                buffer: EditBuffer::new(),
                indicator: SyncIndicator::new(config.saved_indicator),
                autosave: DelayedAction::new(),
                autosave_debounce: config.autosave_debounce,
                save_lock: Mutex::new(()),
            }),
        })
    }

    pub fn domain_id(&self) -> &str {
        &self.inner.domain_id
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.inner.buffer
    }

    pub fn indicator(&self) -> &SyncIndicator {
        &self.inner.indicator
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncState> {
        self.inner.indicator.subscribe()
    }

    /// Whether an autosave is waiting for its debounce window.
    pub fn autosave_pending(&self) -> bool {
        self.inner.autosave.is_pending()
    }

    /// Buffer an edit and (re)arm the autosave timer.
    pub fn record_field_edit(
        &self,
        entity_id: &str,
        field: EditableField,
        value: JsonValue,
        source: EditSource,
    ) -> Result<()> {
        let unsaved = self
            .inner
            .buffer
            .record_field_edit(entity_id, field, value, source)?;
        self.inner.indicator.set_unsaved(unsaved);
        self.arm_autosave();
        Ok(())
    }

    /// Manual sync: cancel a pending autosave and save now.
    pub async fn sync_now(&self) -> Result<SyncOutcome> {
        if self.inner.autosave.cancel() {
            debug!(domain_id = %self.inner.domain_id, "Pending autosave cancelled by manual sync");
        }
        self.save().await
    }

    /// Persist every buffered edit.
    pub async fn save(&self) -> Result<SyncOutcome> {
        let _guard = self.inner.save_lock.lock().await;

        let snapshot = self.inner.buffer.snapshot();
        if snapshot.is_empty() {
            debug!(domain_id = %self.inner.domain_id, "Nothing to save, already synced");
            return Ok(SyncOutcome::AlreadySynced);
        }

        let sync_id = Uuid::now_v7();
        let start = Instant::now();
        self.inner.indicator.saving();
        info!(
            subsystem = "sync",
            %sync_id,
            domain_id = %self.inner.domain_id,
            entity_count = snapshot.len(),
            "Saving pending edits"
        );

        let mut overview_failures = 0;
        for (entity_id, changes) in &snapshot {
            if let Err(e) = self.write_record(entity_id, changes).await {
                error!(
                    subsystem = "sync",
                    %sync_id,
                    domain_id = %self.inner.domain_id,
                    entity_id = %entity_id,
                    error = %e,
                    "Failed to save annotation record"
                );
                self.inner.indicator.failed(e.detail());
                return Err(e);
            }

            if let Err(e) = self
                .inner
                .overview
                .regenerate(&self.inner.domain_id, entity_id, true)
                .await
            {
                overview_failures += 1;
                warn!(
                    %sync_id,
                    entity_id = %entity_id,
                    error = %e,
                    "Overview regeneration failed, record was saved"
                );
            }
        }

        let unsaved = self.inner.buffer.commit(&snapshot);
        self.inner.indicator.set_unsaved(unsaved);
        self.inner.indicator.saved();

        info!(
            subsystem = "sync",
            %sync_id,
            domain_id = %self.inner.domain_id,
            entity_count = snapshot.len(),
            overview_failures,
            unsaved,
            duration_ms = start.elapsed().as_millis() as u64,
            "Saved pending edits"
        );

        Ok(SyncOutcome::Saved {
            entities: snapshot.len(),
            overview_failures,
        })
    }

    async fn write_record(&self, entity_id: &str, changes: &PendingChanges) -> Result<()> {
        let path = annotation_path(&self.inner.domain_id, entity_id)?;

        let mut record = match self
            .inner
            .store
            .read(&path)
            .await
            .map_err(|e| persistence(&path, e))?
        {
            Some(bytes) => AnnotationRecord::from_slice(&bytes)
                .map_err(|e| Error::Persistence(format!("{} is corrupt: {}", path, e.detail())))?,
            None => {
                debug!(path = %path, "No annotation record yet, starting empty");
                AnnotationRecord::new()
            }
        };

        record.apply(changes.iter());
        let bytes = record
            .to_vec_pretty()
            .map_err(|e| persistence(&path, e))?;
        self.inner
            .store
            .write(&path, &bytes)
            .await
            .map_err(|e| persistence(&path, e))?;

        self.inner.buffer.rebase(entity_id, record);
        Ok(())
    }

    fn arm_autosave(&self) {
        let controller: Weak<ControllerInner> = Arc::downgrade(&self.inner);
        self.inner.autosave.arm(self.inner.autosave_debounce, async move {
            let Some(inner) = controller.upgrade() else {
                return;
            };
            // Failures are already logged and shown on the indicator.
            let _ = PersistenceController { inner }.save().await;
        });
        debug!(
            domain_id = %self.inner.domain_id,
            debounce_ms = self.inner.autosave_debounce.as_millis() as u64,
            "Autosave armed"
        );
    }
}

fn persistence(path: &str, e: Error) -> Error {
    match e {
        Error::Persistence(_) => e,
        other => Error::Persistence(format!("{}: {}", path, other.detail())),
    }
}
