//! Structured logging field name constants for marginalia.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Persistence failures, anything the user must act on |
//! | WARN  | Per-entity capability failures, overview regeneration failures |
//! | INFO  | Lifecycle events (batch start/finish, save complete) |
//! | DEBUG | Decision points (gate rejections, debounce arm, config choices) |
//! | TRACE | Per-entity iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID for one save pass. Format: UUIDv7 (time-ordered).
pub const SYNC_ID: &str = "sync_id";

/// Subsystem originating the log event.
/// Values: "sync", "jobs", "store", "capabilities", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "edit_buffer", "controller", "runner", "gate", "http"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "save", "run_batch", "invoke", "regenerate"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Domain the entity belongs to.
pub const DOMAIN_ID: &str = "domain_id";

/// Entity (table) being operated on.
pub const ENTITY_ID: &str = "entity_id";

/// Editable field name.
pub const FIELD: &str = "field";

/// Job identifier.
pub const JOB_ID: &str = "job_id";

/// Batch kind slug.
pub const BATCH_KIND: &str = "batch_kind";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of entities in a working set or save pass.
pub const ENTITY_COUNT: &str = "entity_count";

/// Successful per-entity invocations in a batch.
pub const SUCCESS_COUNT: &str = "success_count";

/// Failed per-entity invocations in a batch.
pub const ERROR_COUNT: &str = "error_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
