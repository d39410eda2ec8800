//! Pending field edits, keyed by entity.
//!
//! Both editing surfaces (the grid and the detail panel) write through
//! [`EditBuffer::record_field_edit`]. The buffer holds at most one value per
//! (entity, field); a later edit replaces an earlier one.
//!
//! When the detail panel is focused on an entity, the buffer publishes a
//! mirror of that entity's record with its pending edits overlaid, so a grid
//! edit shows up in the panel immediately.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value as JsonValue;
use tokio::sync::watch;
use tracing::debug;

use marginalia_core::{validate_segment, AnnotationRecord, EditableField, Result};

/// Pending values for one entity.
pub type PendingChanges = BTreeMap<EditableField, JsonValue>;

/// Copy of the whole buffer, ordered by entity id.
pub type BufferSnapshot = BTreeMap<String, PendingChanges>;

/// Which surface produced an edit. Recorded in logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSource {
    Grid,
    DetailPanel,
}

impl fmt::Display for EditSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditSource::Grid => f.write_str("grid"),
            EditSource::DetailPanel => f.write_str("detail_panel"),
        }
    }
}

/// What the detail panel shows for its focused entity.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorView {
    pub entity_id: String,
    pub record: AnnotationRecord,
}

struct Focus {
    entity_id: String,
    base: AnnotationRecord,
}

#[derive(Default)]
struct BufferState {
    pending: BufferSnapshot,
    focus: Option<Focus>,
}

impl BufferState {
    fn mirror(&self) -> Option<MirrorView> {
        let focus = self.focus.as_ref()?;
        let mut record = focus.base.clone();
        if let Some(changes) = self.pending.get(&focus.entity_id) {
            record.apply(changes.iter());
        }
        Some(MirrorView {
            entity_id: focus.entity_id.clone(),
            record,
        })
    }
}

struct BufferInner {
    state: Mutex<BufferState>,
    mirror_tx: watch::Sender<Option<MirrorView>>,
}

/// In-memory map of entity id to pending field changes.
#[derive(Clone)]
pub struct EditBuffer {
    inner: Arc<BufferInner>,
}

impl Default for EditBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EditBuffer {
    pub fn new() -> Self {
        let (mirror_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(BufferInner {
                state: Mutex::new(BufferState::default()),
                mirror_tx,
            }),
        }
    }

    /// Upsert `value` for (`entity_id`, `field`). Returns the pending-entity count.
    pub fn record_field_edit(
        &self,
        entity_id: &str,
        field: EditableField,
        value: JsonValue,
        source: EditSource,
    ) -> Result<usize> {
        validate_segment("entity id", entity_id)?;

        let mut state = self.lock();
        state
            .pending
            .entry(entity_id.to_string())
            .or_default()
            .insert(field, value);
        let size = state.pending.len();

        debug!(entity_id, %field, %source, unsaved = size, "Recorded field edit");

        if state
            .focus
            .as_ref()
            .is_some_and(|focus| focus.entity_id == entity_id)
        {
            self.inner.mirror_tx.send_replace(state.mirror());
        }
        Ok(size)
    }

    /// Number of entities with pending changes.
    pub fn size(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn pending_for(&self, entity_id: &str) -> Option<PendingChanges> {
        self.lock().pending.get(entity_id).cloned()
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        self.lock().pending.clone()
    }

    /// Drop every pending change.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.pending.clear();
        self.refresh_mirror(&state);
    }

    /// Remove the values in `snapshot` that are still current.
    ///
    /// A value edited again after the snapshot was taken stays pending.
    /// Returns the pending-entity count afterwards.
    pub fn commit(&self, snapshot: &BufferSnapshot) -> usize {
        let mut state = self.lock();
        for (entity_id, saved) in snapshot {
            let Some(current) = state.pending.get_mut(entity_id) else {
                continue;
            };
            for (field, value) in saved {
                if current.get(field) == Some(value) {
                    current.remove(field);
                }
            }
            if current.is_empty() {
                state.pending.remove(entity_id);
            }
        }
        self.refresh_mirror(&state);
        state.pending.len()
    }

    /// Show `entity_id` in the detail panel, starting from `base`.
    pub fn focus(&self, entity_id: impl Into<String>, base: AnnotationRecord) {
        let mut state = self.lock();
        state.focus = Some(Focus {
            entity_id: entity_id.into(),
            base,
        });
        self.refresh_mirror(&state);
    }

    pub fn unfocus(&self) {
        let mut state = self.lock();
        state.focus = None;
        self.refresh_mirror(&state);
    }

    /// Replace the focused entity's base record, e.g. after it was saved.
    pub fn rebase(&self, entity_id: &str, base: AnnotationRecord) {
        let mut state = self.lock();
        match state.focus.as_mut() {
            Some(focus) if focus.entity_id == entity_id => focus.base = base,
            _ => return,
        }
        self.refresh_mirror(&state);
    }

    pub fn mirror(&self) -> Option<MirrorView> {
        self.lock().mirror()
    }

    pub fn subscribe_mirror(&self) -> watch::Receiver<Option<MirrorView>> {
        self.inner.mirror_tx.subscribe()
    }

    fn refresh_mirror(&self, state: &BufferState) {
        let mirror = state.mirror();
        self.inner.mirror_tx.send_if_modified(|current| {
            if *current == mirror {
                return false;
            }
            *current = mirror;
            true
        });
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
