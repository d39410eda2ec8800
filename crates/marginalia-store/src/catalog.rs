//! Entity catalogs: where working sets come from.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use marginalia_core::{validate_segment, EntityCatalog, Error, Result};

/// Active filters of the grid view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Case-insensitive substring the entity id must contain.
    pub name_contains: Option<String>,
    /// Explicit allow-list of entity ids.
    pub include: Option<BTreeSet<String>>,
}

impl CatalogFilter {
    pub fn name_contains(mut self, needle: impl Into<String>) -> Self {
        self.name_contains = Some(needle.into());
        self
    }

    pub fn include<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn matches(&self, entity_id: &str) -> bool {
        if let Some(ref needle) = self.name_contains {
            if !entity_id
                .to_lowercase()
                .contains(needle.to_lowercase().as_str())
            {
                return false;
            }
        }
        match self.include {
            Some(ref allowed) => allowed.contains(entity_id),
            None => true,
        }
    }
}

/// Catalog reading entity directories of one domain from the data root.
///
/// Entities are the sub-directories of `{root}/{domain_id}`, sorted by name.
/// Hidden directories are skipped.
#[derive(Debug, Clone)]
pub struct FsEntityCatalog {
    root: PathBuf,
    domain_id: String,
    filter: Arc<RwLock<CatalogFilter>>,
}

impl FsEntityCatalog {
    pub fn new(root: impl Into<PathBuf>, domain_id: impl Into<String>) -> Result<Self> {
        let domain_id = domain_id.into();
        validate_segment("domain id", &domain_id)?;
        Ok(Self {
            root: root.into(),
            domain_id,
            filter: Arc::new(RwLock::new(CatalogFilter::default())),
        })
    }

    pub fn domain_id(&self) -> &str {
        &self.domain_id
    }

    /// Replace the active filter. Snapshots already taken are unaffected.
    pub fn set_filter(&self, filter: CatalogFilter) {
        let mut current = self
            .filter
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = filter;
    }

    fn current_filter(&self) -> CatalogFilter {
        self.filter
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl EntityCatalog for FsEntityCatalog {
    async fn visible_entities(&self) -> Result<Vec<String>> {
        let domain_dir = self.root.join(&self.domain_id);
        let mut entries = match fs::read_dir(&domain_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::Catalog(format!(
                    "domain directory not found: {}",
                    domain_dir.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let filter = self.current_filter();
        let mut entities = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') || !filter.matches(&name) {
                continue;
            }
            entities.push(name);
        }
        entities.sort();

        debug!(
            domain_id = %self.domain_id,
            entity_count = entities.len(),
            "catalog: resolved visible entities"
        );
        Ok(entities)
    }
}

/// Catalog over a fixed, ordered list of entity ids.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entities: Arc<RwLock<Vec<String>>>,
    filter: Arc<RwLock<CatalogFilter>>,
}

impl StaticCatalog {
    pub fn new<I, S>(entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entities: Arc::new(RwLock::new(entities.into_iter().map(Into::into).collect())),
            filter: Arc::new(RwLock::new(CatalogFilter::default())),
        }
    }

    /// Replace the underlying entity list, keeping its order.
    pub fn set_entities<I, S>(&self, entities: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut current = self
            .entities
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = entities.into_iter().map(Into::into).collect();
    }

    pub fn set_filter(&self, filter: CatalogFilter) {
        let mut current = self
            .filter
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = filter;
    }
}

#[async_trait]
impl EntityCatalog for StaticCatalog {
    async fn visible_entities(&self) -> Result<Vec<String>> {
        let filter = self
            .filter
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        let entities = self
            .entities
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entities
            .iter()
            .filter(|id| filter.matches(id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches() {
        let filter = CatalogFilter::default().name_contains("ORD");
        assert!(filter.matches("orders"));
        assert!(filter.matches("purchase_orders"));
        assert!(!filter.matches("customers"));

        let filter = CatalogFilter::default().include(["orders", "invoices"]);
        assert!(filter.matches("orders"));
        assert!(!filter.matches("customers"));
    }

    #[tokio::test]
    async fn test_static_catalog_keeps_order() {
        let catalog = StaticCatalog::new(["orders", "customers", "invoices"]);
        assert_eq!(
            catalog.visible_entities().await.unwrap(),
            vec!["orders", "customers", "invoices"]
        );

        catalog.set_filter(CatalogFilter::default().include(["invoices", "orders"]));
        assert_eq!(
            catalog.visible_entities().await.unwrap(),
            vec!["orders", "invoices"]
        );
    }

    #[tokio::test]
    async fn test_fs_catalog_lists_sorted_directories() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["orders", "customers", ".trash", "invoices"] {
            std::fs::create_dir_all(dir.path().join("sales").join(name)).unwrap();
        }
        std::fs::write(dir.path().join("sales/README.md"), "notes").unwrap();

        let catalog = FsEntityCatalog::new(dir.path(), "sales").unwrap();
        assert_eq!(
            catalog.visible_entities().await.unwrap(),
            vec!["customers", "invoices", "orders"]
        );

        catalog.set_filter(CatalogFilter::default().name_contains("o"));
        assert_eq!(
            catalog.visible_entities().await.unwrap(),
            vec!["customers", "invoices", "orders"]
        );

        catalog.set_filter(CatalogFilter::default().name_contains("voice"));
        assert_eq!(catalog.visible_entities().await.unwrap(), vec!["invoices"]);
    }

    #[tokio::test]
    async fn test_fs_catalog_missing_domain_is_catalog_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FsEntityCatalog::new(dir.path(), "nowhere").unwrap();
        assert!(matches!(
            catalog.visible_entities().await,
            Err(Error::Catalog(_))
        ));
    }

    #[test]
    fn test_fs_catalog_rejects_bad_domain() {
        assert!(FsEntityCatalog::new("/tmp", "../etc").is_err());
    }
}
