//! Human-readable output lines.

use marginalia_core::{BatchKind, BatchSettings, JobEvent};
use marginalia_jobs::{BatchOutcome, SkipReason};
use marginalia_sync::SyncOutcome;

pub fn event_line(event: &JobEvent) -> String {
    match event {
        JobEvent::Started { job_id, kind } => format!("[{}] started {}", job_id, kind.display_name()),
        JobEvent::Progress {
            job_id,
            progress,
            message,
        } => format!("[{}] {:>3}% {}", job_id, progress, message),
        JobEvent::Completed { job_id, message } => format!("[{}] completed: {}", job_id, message),
        JobEvent::Failed { job_id, message } => format!("[{}] failed: {}", job_id, message),
    }
}

pub fn outcome_line(kind: BatchKind, outcome: &BatchOutcome) -> String {
    match outcome {
        BatchOutcome::Skipped(SkipReason::AlreadyRunning) => {
            format!("Skipped: a {} batch is already running", kind.family())
        }
        BatchOutcome::Skipped(SkipReason::EmptyWorkingSet) => {
            "Skipped: no entities match the current filter".to_string()
        }
        BatchOutcome::Finished(job) => format!("{}: {}", job.name, job.message),
    }
}

pub fn sync_line(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::AlreadySynced => "Already synced".to_string(),
        SyncOutcome::Saved {
            entities,
            overview_failures: 0,
        } => format!("Saved {} entities", entities),
        SyncOutcome::Saved {
            entities,
            overview_failures,
        } => format!(
            "Saved {} entities ({} overview regenerations failed)",
            entities, overview_failures
        ),
    }
}

/// One row per batch kind: slug, family, effective overwrite, name.
pub fn kinds_table(settings: &BatchSettings) -> String {
    let mut out = format!("{:<18} {:<9} {:<10} {}\n", "KIND", "FAMILY", "OVERWRITE", "NAME");
    for kind in BatchKind::ALL {
        out.push_str(&format!(
            "{:<18} {:<9} {:<10} {}\n",
            kind.as_slug(),
            kind.family().to_string(),
            settings.overwrite_for(kind),
            kind.display_name()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use marginalia_core::{Job, JobStatus};

    #[test]
    fn test_event_lines() {
        let line = event_line(&JobEvent::Progress {
            job_id: "fetch-samples-1".to_string(),
            progress: 33,
            message: "1/3: orders".to_string(),
        });
        assert_eq!(line, "[fetch-samples-1]  33% 1/3: orders");

        let line = event_line(&JobEvent::Failed {
            job_id: "fetch-samples-1".to_string(),
            message: "Fetched 2, 1 errors".to_string(),
        });
        assert_eq!(line, "[fetch-samples-1] failed: Fetched 2, 1 errors");
    }

    #[test]
    fn test_outcome_lines() {
        let mut job = Job::new("ai-analysis-1", BatchKind::AiAnalysis);
        job.status = JobStatus::Completed;
        job.message = "Analyzed 4".to_string();
        assert_eq!(
            outcome_line(BatchKind::AiAnalysis, &BatchOutcome::Finished(job)),
            "AI analysis: Analyzed 4"
        );
        assert!(outcome_line(
            BatchKind::DetailFetch,
            &BatchOutcome::Skipped(SkipReason::AlreadyRunning)
        )
        .contains("already running"));
    }

    #[test]
    fn test_sync_lines() {
        assert_eq!(sync_line(&SyncOutcome::AlreadySynced), "Already synced");
        assert_eq!(
            sync_line(&SyncOutcome::Saved {
                entities: 2,
                overview_failures: 0
            }),
            "Saved 2 entities"
        );
        assert!(sync_line(&SyncOutcome::Saved {
            entities: 2,
            overview_failures: 1
        })
        .contains("1 overview"));
    }

    #[test]
    fn test_kinds_table_reflects_overrides() {
        let settings = BatchSettings::default().with_overwrite(BatchKind::AiAnalysis, true);
        let table = kinds_table(&settings);
        assert_eq!(table.lines().count(), 6);
        let ai = table
            .lines()
            .find(|line| line.starts_with("ai-analysis"))
            .unwrap();
        assert!(ai.contains("true"), "{}", ai);
    }
}
