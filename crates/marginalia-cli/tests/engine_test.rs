//! End-to-end tests of the wired engine against a temporary catalog and a
//! mock capability service.

use std::path::Path;

use serde_json::{json, Value as JsonValue};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use marginalia_cli::{Engine, EngineOptions};
use marginalia_core::{BatchKind, EditableField, EngineConfig, JobStatus};
use marginalia_jobs::{BatchOutcome, SkipReason};
use marginalia_store::CatalogFilter;
use marginalia_sync::{EditSource, SyncOutcome};

fn catalog_with(root: &Path, domain: &str, entities: &[&str]) {
    for entity in entities {
        std::fs::create_dir_all(root.join(domain).join(entity)).unwrap();
    }
}

fn config_for(root: &Path, server: &MockServer) -> EngineConfig {
    EngineConfig::default()
        .with_data_dir(root)
        .with_capability_url(server.uri())
}

#[tokio::test]
async fn test_batch_over_catalog_directories() {
    let dir = tempfile::tempdir().unwrap();
    catalog_with(dir.path(), "sales", &["orders", "customers", "invoices"]);
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/capabilities/fetch-samples"))
        .and(body_partial_json(json!({"entity_id": "customers"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("warehouse timeout"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/capabilities/fetch-samples"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let engine = Engine::open(
        config_for(dir.path(), &server),
        "sales",
        EngineOptions::default(),
    )
    .await
    .unwrap();
    let outcome = engine.runner.run_batch(BatchKind::SampleFetch).await;

    let job = outcome.job().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.message, "Fetched 2, 1 errors");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_filter_limits_working_set() {
    let dir = tempfile::tempdir().unwrap();
    catalog_with(dir.path(), "sales", &["orders", "order_lines", "customers"]);
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/capabilities/ai-analysis"))
        .and(body_partial_json(json!({"overwrite": false})))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let options = EngineOptions {
        filter: CatalogFilter::default().name_contains("ORDER"),
        ..EngineOptions::default()
    };
    let engine = Engine::open(config_for(dir.path(), &server), "sales", options)
        .await
        .unwrap();
    let outcome = engine.runner.run_batch(BatchKind::AiAnalysis).await;

    assert_eq!(outcome.job().unwrap().message, "Analyzed 2");
}

#[tokio::test]
async fn test_empty_domain_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("sales")).unwrap();
    let server = MockServer::start().await;

    let engine = Engine::open(
        config_for(dir.path(), &server),
        "sales",
        EngineOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        engine.runner.run_batch(BatchKind::DetailFetch).await,
        BatchOutcome::Skipped(SkipReason::EmptyWorkingSet)
    );
    assert!(engine.jobs.is_empty());
}

#[tokio::test]
async fn test_missing_domain_fails_job() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;

    let engine = Engine::open(
        config_for(dir.path(), &server),
        "sales",
        EngineOptions::default(),
    )
    .await
    .unwrap();
    let outcome = engine.runner.run_batch(BatchKind::CategoricalFetch).await;

    let job = outcome.job().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.message.contains("domain directory not found"), "{}", job.message);
}

#[tokio::test]
async fn test_local_overview_generation_batch() {
    let dir = tempfile::tempdir().unwrap();
    catalog_with(dir.path(), "sales", &["orders"]);
    std::fs::write(
        dir.path().join("sales/orders/annotation.json"),
        r#"{"suggestedName": "Orders"}"#,
    )
    .unwrap();
    let server = MockServer::start().await;

    let engine = Engine::open(
        config_for(dir.path(), &server),
        "sales",
        EngineOptions::default(),
    )
    .await
    .unwrap();
    let outcome = engine.runner.run_batch(BatchKind::OverviewGeneration).await;

    assert_eq!(outcome.job().unwrap().message, "Generated 1");
    let overview = std::fs::read_to_string(dir.path().join("sales/orders/overview.md")).unwrap();
    assert!(overview.starts_with("# Orders"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_annotate_writes_record_and_overview() {
    let dir = tempfile::tempdir().unwrap();
    catalog_with(dir.path(), "sales", &["orders"]);
    let server = MockServer::start().await;

    let engine = Engine::open(
        config_for(dir.path(), &server),
        "sales",
        EngineOptions::default(),
    )
    .await
    .unwrap();
    engine
        .controller
        .record_field_edit("orders", EditableField::UsageStatus, json!("In Use"), EditSource::DetailPanel)
        .unwrap();
    engine
        .controller
        .record_field_edit("orders", EditableField::Action, json!("Approved"), EditSource::DetailPanel)
        .unwrap();

    let outcome = engine.controller.sync_now().await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Saved {
            entities: 1,
            overview_failures: 0
        }
    );

    let record = std::fs::read(dir.path().join("sales/orders/annotation.json")).unwrap();
    let record: JsonValue = serde_json::from_slice(&record).unwrap();
    assert_eq!(record, json!({"usageStatus": "In Use", "action": "Approved"}));
    assert!(dir.path().join("sales/orders/overview.md").exists());
}
