//! Sync indicator published to the UI.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Phase of the most recent save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Saving,
    /// Transient; returns to `Idle` after the indicator's display window.
    Saved,
    /// Persists until the next save attempt.
    Error(String),
}

/// State behind the "N unsaved" badge and the save toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub unsaved: usize,
    pub phase: SyncPhase,
}

impl SyncState {
    /// Badge text, or `None` when nothing is pending.
    pub fn badge(&self) -> Option<String> {
        (self.unsaved > 0).then(|| format!("{} unsaved", self.unsaved))
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            unsaved: 0,
            phase: SyncPhase::Idle,
        }
    }
}

struct IndicatorInner {
    tx: watch::Sender<SyncState>,
    generation: AtomicU64,
    saved_for: Duration,
}

/// Publishes [`SyncState`] through a watch channel.
#[derive(Clone)]
pub struct SyncIndicator {
    inner: Arc<IndicatorInner>,
}

impl SyncIndicator {
    pub fn new(saved_for: Duration) -> Self {
        let (tx, _) = watch::channel(SyncState::default());
        Self {
            inner: Arc::new(IndicatorInner {
                tx,
                generation: AtomicU64::new(0),
                saved_for,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.tx.subscribe()
    }

    pub fn state(&self) -> SyncState {
        self.inner.tx.borrow().clone()
    }

    pub fn set_unsaved(&self, unsaved: usize) {
        self.inner.tx.send_if_modified(|state| {
            let changed = state.unsaved != unsaved;
            state.unsaved = unsaved;
            changed
        });
    }

    pub fn saving(&self) {
        self.set_phase(SyncPhase::Saving);
    }

    /// Show "Saved", then fall back to `Idle` unless a newer phase replaced it.
    pub fn saved(&self) {
        let generation = self.set_phase(SyncPhase::Saved);
        let inner = Arc::downgrade(&self.inner);
        let saved_for = self.inner.saved_for;

        tokio::spawn(async move {
            tokio::time::sleep(saved_for).await;
            let Some(inner) = inner.upgrade() else {
                return;
            };
            if inner.generation.load(Ordering::SeqCst) == generation {
                inner.tx.send_modify(|state| state.phase = SyncPhase::Idle);
            }
        });
    }

    pub fn failed(&self, message: impl Into<String>) {
        self.set_phase(SyncPhase::Error(message.into()));
    }

    fn set_phase(&self, phase: SyncPhase) -> u64 {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.tx.send_modify(|state| state.phase = phase);
        generation
    }
}
