//! Core traits for marginalia's collaborators.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::BatchKind;

// =============================================================================
// RECORD STORAGE
// =============================================================================

/// Reader/writer for documents addressed by relative path.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read the bytes at `path`. A missing document is `Ok(None)`, not an error.
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Write the bytes at `path`, replacing any previous content.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;
}

// =============================================================================
// ENTITY CATALOG
// =============================================================================

/// Source of the entity ids visible under the active filters.
#[async_trait]
pub trait EntityCatalog: Send + Sync {
    /// Ordered snapshot of visible entity ids.
    async fn visible_entities(&self) -> Result<Vec<String>>;
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// One per-entity capability invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRequest {
    pub domain_id: String,
    pub entity_id: String,
    pub overwrite: bool,
    /// Kind-specific options (row limits, model name, ...).
    #[serde(default)]
    pub options: JsonValue,
}

/// External operation invoked once per entity by a batch task.
#[async_trait]
pub trait EntityCapability: Send + Sync {
    /// The batch kind this capability serves.
    fn kind(&self) -> BatchKind;

    /// Run the capability for one entity.
    async fn invoke(&self, request: &CapabilityRequest) -> Result<()>;
}

/// Regenerates the derived overview artifact of an entity.
#[async_trait]
pub trait OverviewGenerator: Send + Sync {
    async fn regenerate(&self, domain_id: &str, entity_id: &str, overwrite: bool) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capability_request_wire_shape() {
        let request = CapabilityRequest {
            domain_id: "sales".to_string(),
            entity_id: "orders".to_string(),
            overwrite: true,
            options: json!({"rows": 100}),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "domain_id": "sales",
                "entity_id": "orders",
                "overwrite": true,
                "options": {"rows": 100}
            })
        );
    }

    #[test]
    fn test_capability_request_options_default_to_null() {
        let request: CapabilityRequest = serde_json::from_value(json!({
            "domain_id": "sales",
            "entity_id": "orders",
            "overwrite": false
        }))
        .unwrap();
        assert!(request.options.is_null());
    }
}
