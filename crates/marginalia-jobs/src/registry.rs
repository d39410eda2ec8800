//! Capability lookup by batch kind.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use marginalia_core::{BatchKind, EntityCapability};

/// Maps each batch kind to the capability that performs it per entity.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<BatchKind, Arc<dyn EntityCapability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability under its own kind, replacing any previous one.
    pub fn register<C: EntityCapability + 'static>(&mut self, capability: C) {
        self.register_arc(Arc::new(capability));
    }

    pub fn register_arc(&mut self, capability: Arc<dyn EntityCapability>) {
        let kind = capability.kind();
        self.capabilities.insert(kind, capability);
        debug!(%kind, "Registered capability");
    }

    pub fn with<C: EntityCapability + 'static>(mut self, capability: C) -> Self {
        self.register(capability);
        self
    }

    pub fn get(&self, kind: BatchKind) -> Option<Arc<dyn EntityCapability>> {
        self.capabilities.get(&kind).cloned()
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> Vec<BatchKind> {
        BatchKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.capabilities.contains_key(kind))
            .collect()
    }
}
