//! marginalia: run batch enrichment jobs and record annotations from the shell.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use marginalia_cli::report::{event_line, kinds_table, outcome_line, sync_line};
use marginalia_cli::{Engine, EngineOptions, FieldAssignment, LogSettings, OverviewSource};
use marginalia_core::{BatchKind, EngineConfig, JobStatus};
use marginalia_jobs::BatchOutcome;
use marginalia_store::CatalogFilter;
use marginalia_sync::EditSource;

#[derive(Parser)]
#[command(name = "marginalia")]
#[command(author, version, about = "Batch annotation and sync for the data catalog")]
#[command(propagate_version = true)]
struct Cli {
    /// Catalog data root (overrides MARGINALIA_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Capability service URL (overrides MARGINALIA_CAPABILITY_URL)
    #[arg(long, global = true)]
    capability_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one batch task over the domain's visible entities
    Batch {
        /// Batch kind slug (see `marginalia kinds`)
        kind: BatchKind,

        /// Domain id
        #[arg(short, long)]
        domain: String,

        /// Only entities whose id contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Override the kind's default overwrite flag
        #[arg(long)]
        overwrite: Option<bool>,

        /// Regenerate overviews through the capability service
        #[arg(long)]
        remote_overview: bool,
    },

    /// Record field edits for an entity and sync them immediately
    Annotate {
        /// Domain id
        #[arg(short, long)]
        domain: String,

        /// Entity id
        entity: String,

        /// Field assignment, e.g. usageStatus="In Use" (repeatable)
        #[arg(short, long = "set", required = true, num_args = 1..)]
        set: Vec<FieldAssignment>,

        /// Regenerate the overview through the capability service
        #[arg(long)]
        remote_overview: bool,
    },

    /// List batch kinds with their family and overwrite default
    Kinds,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let log_settings = LogSettings::from_env();
    let _log_guard = marginalia_cli::logging::init(&log_settings);

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    if let Some(url) = cli.capability_url {
        config = config.with_capability_url(url);
    }

    match cli.command {
        Commands::Batch {
            kind,
            domain,
            filter,
            overwrite,
            remote_overview,
        } => {
            if let Some(overwrite) = overwrite {
                let batch = config.batch.clone().with_overwrite(kind, overwrite);
                config = config.with_batch_settings(batch);
            }
            let options = EngineOptions {
                filter: filter
                    .map(|f| CatalogFilter::default().name_contains(f))
                    .unwrap_or_default(),
                overview: overview_source(remote_overview),
            };
            let engine = Engine::open(config, &domain, options).await?;
            cmd_batch(&engine, kind).await
        }
        Commands::Annotate {
            domain,
            entity,
            set,
            remote_overview,
        } => {
            let options = EngineOptions {
                overview: overview_source(remote_overview),
                ..EngineOptions::default()
            };
            let engine = Engine::open(config, &domain, options).await?;
            cmd_annotate(&engine, &entity, set).await
        }
        Commands::Kinds => {
            print!("{}", kinds_table(&config.batch));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn overview_source(remote: bool) -> OverviewSource {
    if remote {
        OverviewSource::Remote
    } else {
        OverviewSource::Local
    }
}

async fn cmd_batch(engine: &Engine, kind: BatchKind) -> anyhow::Result<ExitCode> {
    let mut events = engine.jobs.subscribe();
    let mut handle = engine.runner.spawn_batch(kind);

    let outcome = loop {
        tokio::select! {
            result = &mut handle => break result?,
            event = events.recv() => match event {
                Ok(event) => println!("{}", event_line(&event)),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Progress output fell behind"),
                Err(RecvError::Closed) => {}
            },
        }
    };
    while let Ok(event) = events.try_recv() {
        println!("{}", event_line(&event));
    }

    println!("{}", outcome_line(kind, &outcome));
    let failed = matches!(&outcome, BatchOutcome::Finished(job) if job.status == JobStatus::Failed);
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn cmd_annotate(
    engine: &Engine,
    entity_id: &str,
    assignments: Vec<FieldAssignment>,
) -> anyhow::Result<ExitCode> {
    for assignment in assignments {
        engine.controller.record_field_edit(
            entity_id,
            assignment.field,
            assignment.value,
            EditSource::DetailPanel,
        )?;
    }
    info!(entity_id, "Edits recorded, syncing");

    let outcome = engine.controller.sync_now().await?;
    println!("{}", sync_line(&outcome));
    Ok(ExitCode::SUCCESS)
}
