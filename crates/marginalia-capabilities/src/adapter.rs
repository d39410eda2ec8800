//! Adapter turning an [`OverviewGenerator`] into the overview-generation batch kind.

use async_trait::async_trait;

use marginalia_core::{BatchKind, CapabilityRequest, EntityCapability, OverviewGenerator, Result};

/// Runs overview regeneration as a per-entity batch capability.
pub struct OverviewCapability<G> {
    generator: G,
}

impl<G: OverviewGenerator> OverviewCapability<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl<G: OverviewGenerator> EntityCapability for OverviewCapability<G> {
    fn kind(&self) -> BatchKind {
        BatchKind::OverviewGeneration
    }

    async fn invoke(&self, request: &CapabilityRequest) -> Result<()> {
        self.generator
            .regenerate(&request.domain_id, &request.entity_id, request.overwrite)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockOverviewGenerator;
    use serde_json::json;

    #[tokio::test]
    async fn test_forwards_overwrite_flag() {
        let generator = MockOverviewGenerator::new();
        let capability = OverviewCapability::new(generator.clone());

        capability
            .invoke(&CapabilityRequest {
                domain_id: "sales".to_string(),
                entity_id: "orders".to_string(),
                overwrite: false,
                options: json!({}),
            })
            .await
            .unwrap();

        assert_eq!(capability.kind(), BatchKind::OverviewGeneration);
        assert_eq!(
            generator.calls(),
            vec![("sales".to_string(), "orders".to_string(), false)]
        );
    }
}
