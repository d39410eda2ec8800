//! # marginalia-core
//!
//! Core types, traits, and abstractions for the marginalia annotation engine.
//!
//! This crate provides the data model (annotation records, editable fields,
//! batch kinds, jobs) and the trait seams the storage, capability, job, and
//! sync crates are built against.

pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod paths;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::{BatchSettings, EngineConfig};
pub use error::{Error, Result};
pub use events::JobEvent;
pub use models::*;
pub use paths::{annotation_path, overview_path, validate_segment};
pub use traits::*;
