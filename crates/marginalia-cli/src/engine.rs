//! Wires the engine for one domain from an [`EngineConfig`].

use std::sync::Arc;

use tracing::info;

use marginalia_capabilities::{HttpCapabilityClient, HttpCapabilityConfig, OverviewCapability};
use marginalia_core::{validate_segment, EngineConfig, OverviewGenerator, Result};
use marginalia_jobs::{BatchRunner, CapabilityRegistry, JobStore};
use marginalia_store::{CatalogFilter, FsEntityCatalog, FsRecordStore, RecordOverviewRenderer};
use marginalia_sync::{PersistenceController, SyncConfig};

/// Where overviews are regenerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverviewSource {
    /// Render `overview.md` locally from the saved record.
    #[default]
    Local,
    /// Ask the capability service.
    Remote,
}

/// Per-invocation choices layered over [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub filter: CatalogFilter,
    pub overview: OverviewSource,
}

/// The services of one domain: catalog, jobs, batch runner, persistence.
pub struct Engine {
    pub config: EngineConfig,
    pub catalog: Arc<FsEntityCatalog>,
    pub jobs: JobStore,
    pub runner: Arc<BatchRunner>,
    pub controller: PersistenceController,
}

impl Engine {
    /// Build the engine for `domain_id`, checking that the data dir accepts
    /// record writes.
    pub async fn open(
        config: EngineConfig,
        domain_id: &str,
        options: EngineOptions,
    ) -> Result<Self> {
        validate_segment("domain id", domain_id)?;

        let catalog = Arc::new(FsEntityCatalog::new(config.data_dir.clone(), domain_id)?);
        catalog.set_filter(options.filter);

        let store = FsRecordStore::new(config.data_dir.clone());
        store.check_writable().await?;
        let client = Arc::new(HttpCapabilityClient::new(HttpCapabilityConfig::from(&config))?);

        let mut registry = CapabilityRegistry::new();
        for capability in client.all_capabilities() {
            registry.register(capability);
        }

        let overview: Arc<dyn OverviewGenerator> = match options.overview {
            OverviewSource::Local => {
                let renderer = RecordOverviewRenderer::new(store.clone());
                registry.register(OverviewCapability::new(renderer.clone()));
                Arc::new(renderer)
            }
            OverviewSource::Remote => client.clone(),
        };

        let jobs = JobStore::new(config.job_history_limit);
        let runner = Arc::new(
            BatchRunner::new(domain_id, catalog.clone(), registry, jobs.clone())
                .with_settings(config.batch.clone()),
        );
        let controller = PersistenceController::new(
            domain_id,
            Arc::new(store),
            overview,
            SyncConfig::from(&config),
        )?;

        info!(
            domain_id,
            data_dir = %config.data_dir.display(),
            capability_url = %config.capability_url,
            overview = ?options.overview,
            "Engine ready"
        );

        Ok(Self {
            config,
            catalog,
            jobs,
            runner,
            controller,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marginalia_core::Error;

    #[tokio::test]
    async fn test_rejects_bad_domain_id() {
        let result =
            Engine::open(EngineConfig::default(), "../etc", EngineOptions::default()).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unwritable_data_dir_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::write(&data_dir, b"").unwrap();

        let config = EngineConfig::default().with_data_dir(&data_dir);
        let result = Engine::open(config, "sales", EngineOptions::default()).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
