//! # marginalia-sync
//!
//! Edit buffering and record persistence for marginalia.
//!
//! - [`EditBuffer`]: pending field changes from the grid and the detail panel
//! - [`PersistenceController`]: debounced autosave and manual sync into
//!   per-entity annotation records, with best-effort overview regeneration
//! - [`SyncIndicator`]: the "N unsaved" / "Saved" / error state for the UI

pub mod buffer;
pub mod controller;
pub mod delayed;
pub mod status;

pub use buffer::{BufferSnapshot, EditBuffer, EditSource, MirrorView, PendingChanges};
pub use controller::{PersistenceController, SyncConfig, SyncOutcome};
pub use delayed::DelayedAction;
pub use status::{SyncIndicator, SyncPhase, SyncState};
