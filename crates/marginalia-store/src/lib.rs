//! # marginalia-store
//!
//! Storage for annotation records and the entity catalog.
//!
//! - [`FsRecordStore`]: directory-backed [`RecordStore`](marginalia_core::RecordStore)
//!   with atomic writes; a missing record reads as `None`
//! - [`MemoryRecordStore`]: shared in-memory store with I/O counters and
//!   write-failure injection
//! - [`FsEntityCatalog`] / [`StaticCatalog`]: working-set sources
//! - [`RecordOverviewRenderer`]: local overview artifact generator

pub mod catalog;
pub mod fs;
pub mod memory;
pub mod overview;

pub use catalog::{CatalogFilter, FsEntityCatalog, StaticCatalog};
pub use fs::FsRecordStore;
pub use memory::MemoryRecordStore;
pub use overview::{render_overview, RecordOverviewRenderer};
