//! # marginalia-cli
//!
//! Support code for the `marginalia` binary: engine wiring, logging setup,
//! and argument parsing helpers.

pub mod assign;
pub mod engine;
pub mod logging;
pub mod report;

pub use assign::FieldAssignment;
pub use engine::{Engine, EngineOptions, OverviewSource};
pub use logging::LogSettings;
