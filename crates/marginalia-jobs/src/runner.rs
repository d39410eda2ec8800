//! Batch task runner.
//!
//! A batch run applies one capability to every entity of the working set,
//! one entity at a time, and records its progress in the [`JobStore`].
//! Per-entity failures are counted and the run continues; only a failure to
//! resolve the working set (or a kind with no capability) ends a run early.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use marginalia_core::{
    BatchKind, BatchSettings, CapabilityRequest, EntityCapability, EntityCatalog, Error, Job,
    JobStatus, JobUpdate,
};

use crate::registry::CapabilityRegistry;
use crate::store::JobStore;

/// Why a batch run did not create a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A run of the same family is already in flight.
    AlreadyRunning,
    /// No entity is visible under the active filters.
    EmptyWorkingSet,
}

/// Result of [`BatchRunner::run_batch`].
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Nothing ran and no job was created.
    Skipped(SkipReason),
    /// A job was created and has reached a terminal state.
    Finished(Job),
}

impl BatchOutcome {
    pub fn job(&self) -> Option<&Job> {
        match self {
            BatchOutcome::Finished(job) => Some(job),
            BatchOutcome::Skipped(_) => None,
        }
    }
}

/// Runs batch tasks for one domain.
///
/// Runners for different domains share one [`JobStore`], which also holds the
/// family reservations; a family runs at most once across all of them.
pub struct BatchRunner {
    domain_id: String,
    catalog: Arc<dyn EntityCatalog>,
    capabilities: CapabilityRegistry,
    jobs: JobStore,
    settings: BatchSettings,
}

impl BatchRunner {
    pub fn new(
        domain_id: impl Into<String>,
        catalog: Arc<dyn EntityCatalog>,
        capabilities: CapabilityRegistry,
        jobs: JobStore,
    ) -> Self {
        Self {
            domain_id: domain_id.into(),
            catalog,
            capabilities,
            jobs,
            settings: BatchSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: BatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn domain_id(&self) -> &str {
        &self.domain_id
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Whether a run of `kind`'s family is in flight. Drives the disabled
    /// state of every trigger in that family.
    pub fn is_family_running(&self, kind: BatchKind) -> bool {
        self.jobs.is_family_busy(kind.family())
    }

    /// Run `kind` over the current working set and wait for it to finish.
    pub async fn run_batch(&self, kind: BatchKind) -> BatchOutcome {
        let family = kind.family();
        let Some(_permit) = self.jobs.try_reserve(family) else {
            debug!(batch_kind = %kind, %family, "Batch skipped, family already running");
            return BatchOutcome::Skipped(SkipReason::AlreadyRunning);
        };

        let entities = match self.catalog.visible_entities().await {
            Ok(entities) => entities,
            Err(e) => {
                warn!(batch_kind = %kind, domain_id = %self.domain_id, error = %e,
                      "Failed to resolve working set");
                return BatchOutcome::Finished(self.fail_immediately(kind, e.detail()));
            }
        };
        if entities.is_empty() {
            info!(batch_kind = %kind, domain_id = %self.domain_id, "No visible entities, batch skipped");
            return BatchOutcome::Skipped(SkipReason::EmptyWorkingSet);
        }

        let Some(capability) = self.capabilities.get(kind) else {
            warn!(batch_kind = %kind, "No capability registered for batch kind");
            return BatchOutcome::Finished(
                self.fail_immediately(kind, format!("No capability registered for {}", kind)),
            );
        };

        BatchOutcome::Finished(self.execute(kind, capability, entities).await)
    }

    /// Run `kind` on a background task.
    pub fn spawn_batch(self: &Arc<Self>, kind: BatchKind) -> JoinHandle<BatchOutcome> {
        let runner = self.clone();
        tokio::spawn(async move { runner.run_batch(kind).await })
    }

    async fn execute(
        &self,
        kind: BatchKind,
        capability: Arc<dyn EntityCapability>,
        entities: Vec<String>,
    ) -> Job {
        let start = Instant::now();
        let job = self.jobs.start_job(kind);
        let total = entities.len();
        let overwrite = self.settings.overwrite_for(kind);
        let options = self.settings.options_for(kind);

        info!(
            subsystem = "jobs",
            job_id = %job.id,
            batch_kind = %kind,
            domain_id = %self.domain_id,
            entity_count = total,
            overwrite,
            "Batch started"
        );

        let mut success_count = 0;
        let mut error_count = 0;

        for (index, entity_id) in entities.iter().enumerate() {
            self.update(
                &job.id,
                JobUpdate::new().message(format!("{}/{}: {}", index + 1, total, entity_id)),
            );

            let request = CapabilityRequest {
                domain_id: self.domain_id.clone(),
                entity_id: entity_id.clone(),
                overwrite,
                options: options.clone(),
            };
            let result = AssertUnwindSafe(capability.invoke(&request))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(Error::Internal("capability panicked".to_string())));

            match result {
                Ok(()) => {
                    success_count += 1;
                    trace!(job_id = %job.id, entity_id = %entity_id, "Entity processed");
                }
                Err(e) => {
                    error_count += 1;
                    warn!(job_id = %job.id, entity_id = %entity_id, error = %e, "Entity failed");
                }
            }

            self.update(
                &job.id,
                JobUpdate::new()
                    .progress(batch_progress(index + 1, total))
                    .counts(success_count, error_count),
            );
        }

        let status = if error_count > 0 {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        };
        let summary = kind.summary(success_count, error_count);
        let finished = self.finish(&job, JobUpdate::new().status(status).message(summary));

        info!(
            subsystem = "jobs",
            job_id = %job.id,
            batch_kind = %kind,
            success_count,
            error_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch finished"
        );
        finished
    }

    /// Create a job for `kind` and fail it straight away with `message`.
    fn fail_immediately(&self, kind: BatchKind, message: String) -> Job {
        let job = self.jobs.start_job(kind);
        self.finish(&job, JobUpdate::new().status(JobStatus::Failed).message(message))
    }

    fn finish(&self, job: &Job, update: JobUpdate) -> Job {
        match self.jobs.update_job(&job.id, update) {
            Ok(job) => job,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Failed to finish job");
                self.jobs.get(&job.id).unwrap_or_else(|| job.clone())
            }
        }
    }

    fn update(&self, job_id: &str, update: JobUpdate) {
        if let Err(e) = self.jobs.update_job(job_id, update) {
            warn!(job_id, error = %e, "Failed to update job");
        }
    }
}

/// Percent complete after `done` of `total` entities, rounded.
pub fn batch_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (done.min(total) as f64 * 100.0 / total as f64).round();
    percent as u8
}
