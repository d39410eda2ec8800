//! Filesystem store, catalog, and overview renderer working on one data root.

use marginalia_core::{
    annotation_path, overview_path, EntityCatalog, OverviewGenerator, RecordStore,
};
use marginalia_store::{CatalogFilter, FsEntityCatalog, FsRecordStore, RecordOverviewRenderer};

#[tokio::test]
async fn test_written_records_show_up_in_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsRecordStore::new(dir.path());

    for entity in ["orders", "customers"] {
        let path = annotation_path("sales", entity).unwrap();
        store.write(&path, b"{}").await.unwrap();
    }

    let catalog = FsEntityCatalog::new(dir.path(), "sales").unwrap();
    assert_eq!(
        catalog.visible_entities().await.unwrap(),
        vec!["customers", "orders"]
    );

    // A snapshot taken before a filter change is unaffected by it.
    let snapshot = catalog.visible_entities().await.unwrap();
    catalog.set_filter(CatalogFilter::default().include(["orders"]));
    assert_eq!(snapshot.len(), 2);
    assert_eq!(catalog.visible_entities().await.unwrap(), vec!["orders"]);
}

#[tokio::test]
async fn test_overview_rendered_next_to_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsRecordStore::new(dir.path());
    store
        .write(
            &annotation_path("sales", "orders").unwrap(),
            br#"{"suggestedName":"Orders","summary":{"short":"Order headers"}}"#,
        )
        .await
        .unwrap();

    let renderer = RecordOverviewRenderer::new(store.clone());
    renderer.regenerate("sales", "orders", true).await.unwrap();

    let md = store
        .read(&overview_path("sales", "orders").unwrap())
        .await
        .unwrap()
        .unwrap();
    let md = String::from_utf8(md).unwrap();
    assert!(md.starts_with("# Orders"));
    assert!(md.contains("**Order headers**"));
    assert!(dir.path().join("sales/orders/overview.md").is_file());
}
