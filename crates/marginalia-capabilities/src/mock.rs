//! Mock capabilities for deterministic testing.
//!
//! ## Usage
//!
//! ```rust
//! use marginalia_capabilities::mock::MockCapability;
//! use marginalia_core::BatchKind;
//!
//! let capability = MockCapability::new(BatchKind::SampleFetch).failing_for("customers");
//! assert_eq!(capability.call_count(), 0);
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use marginalia_core::{BatchKind, CapabilityRequest, EntityCapability, Error, OverviewGenerator, Result};

/// Recording capability that rejects a configured set of entities.
#[derive(Clone)]
pub struct MockCapability {
    kind: BatchKind,
    failing: Arc<HashSet<String>>,
    latency: Duration,
    release: Option<watch::Receiver<bool>>,
    calls: Arc<Mutex<Vec<CapabilityRequest>>>,
}

/// Opens a held [`MockCapability`] so its calls can complete.
pub struct MockRelease {
    tx: watch::Sender<bool>,
}

impl MockRelease {
    pub fn release(&self) {
        let _ = self.tx.send(true);
    }
}

impl MockCapability {
    pub fn new(kind: BatchKind) -> Self {
        Self {
            kind,
            failing: Arc::new(HashSet::new()),
            latency: Duration::ZERO,
            release: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A capability whose calls block until [`MockRelease::release`] is called.
    pub fn held(kind: BatchKind) -> (Self, MockRelease) {
        let (tx, rx) = watch::channel(false);
        let mut capability = Self::new(kind);
        capability.release = Some(rx);
        (capability, MockRelease { tx })
    }

    /// Reject calls for `entity_id`.
    pub fn failing_for(mut self, entity_id: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.failing).insert(entity_id.into());
        self
    }

    /// Sleep before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Requests received so far, in call order.
    pub fn calls(&self) -> Vec<CapabilityRequest> {
        self.lock_calls().clone()
    }

    /// Entity ids received so far, in call order.
    pub fn called_entities(&self) -> Vec<String> {
        self.lock_calls()
            .iter()
            .map(|r| r.entity_id.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<CapabilityRequest>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl EntityCapability for MockCapability {
    fn kind(&self) -> BatchKind {
        self.kind
    }

    async fn invoke(&self, request: &CapabilityRequest) -> Result<()> {
        self.lock_calls().push(request.clone());

        if let Some(mut release) = self.release.clone() {
            // A dropped MockRelease also lets the call through.
            let _ = release.wait_for(|open| *open).await;
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.failing.contains(&request.entity_id) {
            return Err(Error::Capability(format!(
                "{} rejected {}",
                self.kind, request.entity_id
            )));
        }
        Ok(())
    }
}

/// Recording overview generator.
#[derive(Clone, Default)]
pub struct MockOverviewGenerator {
    failing: Arc<HashSet<String>>,
    calls: Arc<Mutex<Vec<(String, String, bool)>>>,
}

impl MockOverviewGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail regeneration for `entity_id`.
    pub fn failing_for(mut self, entity_id: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.failing).insert(entity_id.into());
        self
    }

    /// `(domain_id, entity_id, overwrite)` per call, in call order.
    pub fn calls(&self) -> Vec<(String, String, bool)> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl OverviewGenerator for MockOverviewGenerator {
    async fn regenerate(&self, domain_id: &str, entity_id: &str, overwrite: bool) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((domain_id.to_string(), entity_id.to_string(), overwrite));

        if self.failing.contains(entity_id) {
            return Err(Error::Regeneration(format!(
                "overview template failed for {}",
                entity_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(entity_id: &str) -> CapabilityRequest {
        CapabilityRequest {
            domain_id: "sales".to_string(),
            entity_id: entity_id.to_string(),
            overwrite: true,
            options: json!({}),
        }
    }

    #[tokio::test]
    async fn test_records_calls_and_fails_configured_entities() {
        let capability = MockCapability::new(BatchKind::SampleFetch).failing_for("customers");

        assert!(capability.invoke(&request("orders")).await.is_ok());
        assert!(capability.invoke(&request("customers")).await.is_err());

        assert_eq!(capability.called_entities(), vec!["orders", "customers"]);
        assert_eq!(capability.kind(), BatchKind::SampleFetch);
    }

    #[tokio::test]
    async fn test_held_capability_waits_for_release() {
        let (capability, release) = MockCapability::held(BatchKind::DetailFetch);
        let task = {
            let capability = capability.clone();
            tokio::spawn(async move { capability.invoke(&request("orders")).await })
        };

        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        release.release();
        assert!(task.await.unwrap().is_ok());
        assert_eq!(capability.call_count(), 1);
    }

    #[tokio::test]
    async fn test_overview_generator_mock() {
        let generator = MockOverviewGenerator::new().failing_for("ghost");
        assert!(generator.regenerate("sales", "orders", true).await.is_ok());
        assert!(generator.regenerate("sales", "ghost", false).await.is_err());
        assert_eq!(
            generator.calls(),
            vec![
                ("sales".to_string(), "orders".to_string(), true),
                ("sales".to_string(), "ghost".to_string(), false)
            ]
        );
    }
}
