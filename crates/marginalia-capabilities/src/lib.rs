//! # marginalia-capabilities
//!
//! Backends for the per-entity capabilities batch tasks invoke.
//!
//! - [`HttpCapabilityClient`]: talks to the capability service, one endpoint
//!   per batch kind, and doubles as the remote [`OverviewGenerator`](marginalia_core::OverviewGenerator)
//! - [`OverviewCapability`]: runs any overview generator as a batch kind
//! - [`mock`]: recording capabilities for tests

pub mod adapter;
pub mod http;
pub mod mock;

pub use adapter::OverviewCapability;
pub use http::{HttpCapability, HttpCapabilityClient, HttpCapabilityConfig};
pub use mock::{MockCapability, MockOverviewGenerator, MockRelease};
