//! Job events for the progress panel.
//!
//! The job store publishes one event per insert or update on a broadcast
//! channel. Consumers (progress panel, CLI printer) subscribe independently
//! and may lag; a lagged receiver can always recover by listing the store.

use serde::Serialize;

use crate::models::{BatchKind, Job, JobStatus};

/// Event emitted by the job store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// A job was added in the running state.
    Started { job_id: String, kind: BatchKind },
    /// Progress or message of a running job changed.
    Progress {
        job_id: String,
        progress: u8,
        message: String,
    },
    /// A job reached `completed`.
    Completed { job_id: String, message: String },
    /// A job reached `failed`.
    Failed { job_id: String, message: String },
}

impl JobEvent {
    /// Event describing the current state of `job` after an update.
    pub fn for_update(job: &Job) -> Self {
        match job.status {
            JobStatus::Running => JobEvent::Progress {
                job_id: job.id.clone(),
                progress: job.progress,
                message: job.message.clone(),
            },
            JobStatus::Completed => JobEvent::Completed {
                job_id: job.id.clone(),
                message: job.message.clone(),
            },
            JobStatus::Failed => JobEvent::Failed {
                job_id: job.id.clone(),
                message: job.message.clone(),
            },
        }
    }

    pub fn job_id(&self) -> &str {
        match self {
            JobEvent::Started { job_id, .. }
            | JobEvent::Progress { job_id, .. }
            | JobEvent::Completed { job_id, .. }
            | JobEvent::Failed { job_id, .. } => job_id,
        }
    }

    /// Namespaced event type, e.g. `"job.progress"`.
    pub fn event_type(&self) -> &'static str {
        match self {
            JobEvent::Started { .. } => "job.started",
            JobEvent::Progress { .. } => "job.progress",
            JobEvent::Completed { .. } => "job.completed",
            JobEvent::Failed { .. } => "job.failed",
        }
    }
}
