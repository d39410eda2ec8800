//! # marginalia-jobs
//!
//! Batch task execution for marginalia.
//!
//! This crate provides:
//! - A session-wide [`JobStore`] with bounded history and a broadcast event feed
//! - Per-family mutual exclusion via [`JobStore::try_reserve`]
//! - The [`BatchRunner`], which applies one capability to every visible entity
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use marginalia_core::BatchKind;
//! use marginalia_jobs::{BatchRunner, CapabilityRegistry, JobStore};
//!
//! let jobs = JobStore::default();
//! let registry = CapabilityRegistry::new().with(my_sample_fetcher);
//! let runner = Arc::new(BatchRunner::new("sales", catalog, registry, jobs.clone()));
//!
//! let mut events = jobs.subscribe();
//! let handle = runner.spawn_batch(BatchKind::SampleFetch);
//! while let Ok(event) = events.recv().await {
//!     println!("{}: {:?}", event.event_type(), event);
//! }
//! ```

pub mod gate;
pub mod registry;
pub mod runner;
pub mod store;

pub use gate::FamilyPermit;
pub use registry::CapabilityRegistry;
pub use runner::{batch_progress, BatchOutcome, BatchRunner, SkipReason};
pub use store::JobStore;
