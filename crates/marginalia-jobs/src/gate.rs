//! Per-family reservations for batch runs.
//!
//! The check and the claim happen under one lock, so two near-simultaneous
//! triggers of the same family cannot both start.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use marginalia_core::BatchFamily;

/// Tracks which batch families currently have a run in flight.
///
/// Owned by [`JobStore`](crate::JobStore); runners reserve through
/// [`JobStore::try_reserve`](crate::JobStore::try_reserve).
#[derive(Clone, Default)]
pub(crate) struct FamilyGate {
    busy: Arc<Mutex<HashSet<BatchFamily>>>,
}

impl FamilyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `family`, or `None` if a run of that family is in flight.
    ///
    /// The claim is released when the returned permit is dropped.
    pub fn try_acquire(&self, family: BatchFamily) -> Option<FamilyPermit> {
        if !self.lock().insert(family) {
            debug!(%family, "Family busy, claim refused");
            return None;
        }
        Some(FamilyPermit {
            family,
            busy: self.busy.clone(),
        })
    }

    pub fn is_busy(&self, family: BatchFamily) -> bool {
        self.lock().contains(&family)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<BatchFamily>> {
        self.busy
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Claim on a batch family; releases on drop.
#[derive(Debug)]
pub struct FamilyPermit {
    family: BatchFamily,
    busy: Arc<Mutex<HashSet<BatchFamily>>>,
}

impl FamilyPermit {
    pub fn family(&self) -> BatchFamily {
        self.family
    }
}

impl Drop for FamilyPermit {
    fn drop(&mut self) {
        self.busy
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.family);
    }
}
