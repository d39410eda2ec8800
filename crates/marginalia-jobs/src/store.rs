//! Session-wide job registry.
//!
//! Constructed once at application start and shared by cloning. Every
//! mutation is a key-scoped merge under one short-lived lock, and every
//! change is published as a [`JobEvent`]. The store also owns the family
//! reservations, so every runner sharing it sees the same exclusion.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use marginalia_core::{
    defaults, BatchFamily, BatchKind, Error, Job, JobEvent, JobStatus, JobUpdate, Result,
};

use crate::gate::{FamilyGate, FamilyPermit};

#[derive(Default)]
struct JobTable {
    jobs: HashMap<String, Job>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

struct Inner {
    table: Mutex<JobTable>,
    gate: FamilyGate,
    history_limit: usize,
    event_tx: broadcast::Sender<JobEvent>,
}

/// Registry of batch jobs for the current session.
///
/// Retention: running jobs are always kept; at most `history_limit` finished
/// jobs are kept, evicting the ones that finished earliest.
#[derive(Clone)]
pub struct JobStore {
    inner: Arc<Inner>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new(defaults::JOB_HISTORY_LIMIT)
    }
}

impl JobStore {
    pub fn new(history_limit: usize) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                table: Mutex::new(JobTable::default()),
                gate: FamilyGate::new(),
                history_limit: history_limit.max(1),
                event_tx,
            }),
        }
    }

    /// Subscribe to job events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Insert a job in the running state with progress 0.
    pub fn add_job(&self, job: Job) -> Result<Job> {
        let job = {
            let mut table = self.lock();
            if table.jobs.contains_key(&job.id) {
                return Err(Error::Job(format!("duplicate job id: {}", job.id)));
            }
            Self::insert_running(&mut table, job)
        };
        self.publish(JobEvent::Started {
            job_id: job.id.clone(),
            kind: job.kind,
        });
        Ok(job)
    }

    /// Allocate an id (`{slug}-{unix_millis}`) and insert a running job for `kind`.
    pub fn start_job(&self, kind: BatchKind) -> Job {
        let job = {
            let mut table = self.lock();
            let id = Self::unused_id(&table, kind);
            Self::insert_running(&mut table, Job::new(id, kind))
        };
        self.publish(JobEvent::Started {
            job_id: job.id.clone(),
            kind: job.kind,
        });
        job
    }

    /// Reserve `family` for one batch run.
    ///
    /// Refused while another reservation of the family is held or a job of
    /// the family is running. The check and the claim both happen under the
    /// table lock. The reservation lasts until the permit is dropped.
    pub fn try_reserve(&self, family: BatchFamily) -> Option<FamilyPermit> {
        let table = self.lock();
        if Self::family_running(&table, family) {
            debug!(%family, "Reservation refused, family has a running job");
            return None;
        }
        self.inner.gate.try_acquire(family)
    }

    /// Whether `family` is reserved or has a running job.
    pub fn is_family_busy(&self, family: BatchFamily) -> bool {
        let table = self.lock();
        self.inner.gate.is_busy(family) || Self::family_running(&table, family)
    }

    /// Merge `update` into the stored job.
    ///
    /// Progress never moves backwards. Finished jobs are immutable: updating
    /// one is an error and leaves it untouched. A terminal status forces
    /// progress to 100.
    pub fn update_job(&self, id: &str, update: JobUpdate) -> Result<Job> {
        let job = {
            let mut table = self.lock();
            let job = table
                .jobs
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(format!("job {}", id)))?;

            if job.status.is_terminal() {
                return Err(Error::Job(format!(
                    "job {} already {:?}",
                    id, job.status
                )));
            }

            if let Some(progress) = update.progress {
                job.progress = job.progress.max(progress.min(100));
            }
            if let Some(message) = update.message {
                job.message = message;
            }
            if let Some(success_count) = update.success_count {
                job.success_count = success_count;
            }
            if let Some(error_count) = update.error_count {
                job.error_count = error_count;
            }
            if let Some(status) = update.status {
                job.status = status;
                if status.is_terminal() {
                    job.progress = 100;
                    job.finished_at = Some(Utc::now());
                }
            }

            let snapshot = job.clone();
            if snapshot.status.is_terminal() {
                self.evict_finished(&mut table);
            }
            snapshot
        };

        self.publish(JobEvent::for_update(&job));
        Ok(job)
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.lock().jobs.get(id).cloned()
    }

    /// All retained jobs, newest first.
    pub fn list(&self) -> Vec<Job> {
        let table = self.lock();
        table
            .order
            .iter()
            .rev()
            .filter_map(|id| table.jobs.get(id).cloned())
            .collect()
    }

    /// Running jobs, newest first.
    pub fn running(&self) -> Vec<Job> {
        self.list().into_iter().filter(Job::is_running).collect()
    }

    /// Whether a job of `family` is running.
    pub fn has_running(&self, family: BatchFamily) -> bool {
        Self::family_running(&self.lock(), family)
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn family_running(table: &JobTable, family: BatchFamily) -> bool {
        table
            .jobs
            .values()
            .any(|job| job.is_running() && job.family() == family)
    }

    fn insert_running(table: &mut JobTable, mut job: Job) -> Job {
        job.status = JobStatus::Running;
        job.progress = 0;
        job.finished_at = None;
        table.order.push_back(job.id.clone());
        table.jobs.insert(job.id.clone(), job.clone());
        job
    }

    fn unused_id(table: &JobTable, kind: BatchKind) -> String {
        let base = format!("{}-{}", kind.as_slug(), Utc::now().timestamp_millis());
        if !table.jobs.contains_key(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !table.jobs.contains_key(candidate))
            .unwrap_or(base)
    }

    fn evict_finished(&self, table: &mut JobTable) {
        loop {
            let finished = table
                .jobs
                .values()
                .filter(|job| job.status.is_terminal())
                .count();
            if finished <= self.inner.history_limit {
                return;
            }
            // Ties on finished_at go to the job inserted first.
            let oldest = table
                .order
                .iter()
                .filter_map(|id| table.jobs.get(id))
                .filter(|job| job.status.is_terminal())
                .min_by_key(|job| job.finished_at)
                .map(|job| job.id.clone());
            let Some(oldest) = oldest else {
                return;
            };
            table.jobs.remove(&oldest);
            table.order.retain(|id| id != &oldest);
            debug!(job_id = %oldest, "Evicted finished job from history");
        }
    }

    fn publish(&self, event: JobEvent) {
        // No subscribers is fine; the store itself is the source of truth.
        let _ = self.inner.event_tx.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, JobTable> {
        self.inner.table.lock().unwrap_or_else(|poisoned| {
            warn!("Job table lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
