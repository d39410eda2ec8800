//! HTTP capability service client.
//!
//! Every batch kind maps to one endpoint:
//!
//! ```text
//! POST {base_url}/capabilities/{slug}
//! {"domain_id": "...", "entity_id": "...", "overwrite": true, "options": {...}}
//! ```
//!
//! Any 2xx response is success; anything else rejects the entity with the
//! status and body in the error message.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use marginalia_core::{
    defaults, BatchKind, CapabilityRequest, EngineConfig, EntityCapability, Error,
    OverviewGenerator, Result,
};

/// Connection settings for the capability service.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpCapabilityConfig {
    pub base_url: String,
    /// Transport timeout per request.
    pub timeout_secs: u64,
}

impl Default for HttpCapabilityConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::CAPABILITY_URL.to_string(),
            timeout_secs: defaults::CAPABILITY_TIMEOUT_SECS,
        }
    }
}

impl From<&EngineConfig> for HttpCapabilityConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            base_url: config.capability_url.clone(),
            timeout_secs: config.capability_timeout_secs,
        }
    }
}

/// Client shared by all HTTP-backed capabilities.
#[derive(Debug, Clone)]
pub struct HttpCapabilityClient {
    client: Client,
    base_url: String,
}

impl HttpCapabilityClient {
    pub fn new(config: HttpCapabilityConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        info!(
            base_url = %base_url,
            timeout_secs = config.timeout_secs,
            "Initializing capability client"
        );

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint for a batch kind.
    pub fn endpoint(&self, kind: BatchKind) -> String {
        format!("{}/capabilities/{}", self.base_url, kind.as_slug())
    }

    /// An [`EntityCapability`] for `kind` backed by this client.
    pub fn capability(self: &Arc<Self>, kind: BatchKind) -> HttpCapability {
        HttpCapability {
            client: Arc::clone(self),
            kind,
        }
    }

    /// One capability per batch kind, ready for registration.
    pub fn all_capabilities(self: &Arc<Self>) -> Vec<HttpCapability> {
        BatchKind::ALL
            .iter()
            .map(|kind| self.capability(*kind))
            .collect()
    }

    async fn post(&self, kind: BatchKind, request: &CapabilityRequest) -> Result<()> {
        let start = Instant::now();
        let url = self.endpoint(kind);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Capability(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Capability(format!(
                "{} returned {}: {}",
                kind.as_slug(),
                status,
                body.trim()
            )));
        }

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            batch_kind = %kind,
            entity_id = %request.entity_id,
            duration_ms = elapsed,
            "Capability call complete"
        );
        if elapsed > 60_000 {
            warn!(
                batch_kind = %kind,
                entity_id = %request.entity_id,
                duration_ms = elapsed,
                slow = true,
                "Slow capability call"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl OverviewGenerator for HttpCapabilityClient {
    async fn regenerate(&self, domain_id: &str, entity_id: &str, overwrite: bool) -> Result<()> {
        let request = CapabilityRequest {
            domain_id: domain_id.to_string(),
            entity_id: entity_id.to_string(),
            overwrite,
            options: json!({}),
        };
        self.post(BatchKind::OverviewGeneration, &request)
            .await
            .map_err(|e| Error::Regeneration(e.detail()))
    }
}

/// HTTP-backed capability for one batch kind.
#[derive(Debug, Clone)]
pub struct HttpCapability {
    client: Arc<HttpCapabilityClient>,
    kind: BatchKind,
}

#[async_trait]
impl EntityCapability for HttpCapability {
    fn kind(&self) -> BatchKind {
        self.kind
    }

    async fn invoke(&self, request: &CapabilityRequest) -> Result<()> {
        self.client.post(self.kind, request).await
    }
}
