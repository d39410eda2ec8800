//! Centralized default constants for marginalia.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic numbers.

// =============================================================================
// SYNC
// =============================================================================

/// Quiet window after the last edit before autosave fires (milliseconds).
pub const AUTOSAVE_DEBOUNCE_MS: u64 = 2_000;

/// How long the transient "Saved" confirmation stays visible (milliseconds).
pub const SAVED_INDICATOR_MS: u64 = 3_000;

/// Capacity of the job event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// RECORD LAYOUT
// =============================================================================

/// File name of the per-entity annotation record.
pub const ANNOTATION_FILE: &str = "annotation.json";

/// File name of the derived overview artifact.
pub const OVERVIEW_FILE: &str = "overview.md";

/// Default data root when `MARGINALIA_DATA_DIR` is unset.
pub const DATA_DIR: &str = "./catalog";

// =============================================================================
// JOBS
// =============================================================================

/// Maximum number of finished jobs retained in the job store.
///
/// Running jobs never count against this limit.
pub const JOB_HISTORY_LIMIT: usize = 50;

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Default capability service base URL.
pub const CAPABILITY_URL: &str = "http://127.0.0.1:8765";

/// Transport timeout for a single capability call in seconds.
///
/// AI analysis of wide tables routinely takes several minutes.
pub const CAPABILITY_TIMEOUT_SECS: u64 = 600;

/// Rows requested per entity by the sample fetch.
pub const SAMPLE_ROWS: u32 = 100;

/// Distinct values requested per column by the categorical-value fetch.
pub const CATEGORICAL_MAX_VALUES: u32 = 50;

/// Default model for AI analysis.
pub const AI_MODEL: &str = "gpt-4o-mini";
