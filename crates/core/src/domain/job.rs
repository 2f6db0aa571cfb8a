// Job Domain Model

use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};
use super::request::PosterRequest;

/// Job ID (UUID v4, assigned at creation)
pub type JobId = String;

/// Job lifecycle status
///
/// `pending -> processing -> {completed | failed}`. The two right-hand
/// states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Job Entity: the authoritative record of one rendering work unit.
///
/// Owned exclusively by the `JobRegistry`; everything else receives
/// clones and never mutates them in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub request: PosterRequest,

    /// Reported progress, 0-100 by convention. Deliberately neither
    /// clamped nor monotonic: the record follows whatever the renderer
    /// reports.
    pub progress: u32,
    pub message: Option<String>,
    pub error: Option<String>,
    pub result_path: Option<String>,

    pub created_at: i64, // epoch ms
    pub finished_at: Option<i64>,
}

impl Job {
    /// Create a new Job in `pending`.
    ///
    /// `id` and `created_at` are injected (via IdProvider/TimeProvider),
    /// never generated here.
    pub fn new(id: impl Into<JobId>, created_at: i64, request: PosterRequest) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            request,
            progress: 0,
            message: None,
            error: None,
            result_path: None,
            created_at,
            finished_at: None,
        }
    }

    /// Shallow-merge a patch into the record: supplied fields overwrite,
    /// absent fields persist. Terminal jobs reject every patch.
    pub fn apply(&mut self, patch: JobPatch) -> Result<()> {
        if self.status.is_terminal() {
            return Err(DomainError::TerminalJob {
                status: self.status.to_string(),
            });
        }

        if let Some(next) = patch.status {
            if next != self.status && !self.status.can_transition_to(next) {
                return Err(DomainError::InvalidStatusTransition {
                    from: self.status.to_string(),
                    to: next.to_string(),
                });
            }
            self.status = next;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(message) = patch.message {
            self.message = Some(message);
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
        if let Some(result_path) = patch.result_path {
            self.result_path = Some(result_path);
        }
        if let Some(finished_at) = patch.finished_at {
            self.finished_at = Some(finished_at);
        }
        Ok(())
    }
}

/// Partial update merged into a Job by `JobRegistry::update`.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub progress: Option<u32>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub result_path: Option<String>,
    pub finished_at: Option<i64>,
}

impl JobPatch {
    /// Progress-only update.
    pub fn progress(value: u32) -> Self {
        Self {
            progress: Some(value),
            ..Default::default()
        }
    }

    /// Progress plus stage message.
    pub fn stage(progress: u32, message: impl Into<String>) -> Self {
        Self {
            progress: Some(progress),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Terminal failure with an error text.
    pub fn failed(error: impl Into<String>, finished_at: i64) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(error.into()),
            finished_at: Some(finished_at),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new("job-1", 1000, PosterRequest::new("Tokyo", "Japan"))
    }

    #[test]
    fn test_new_job_is_pending_with_zero_progress() {
        let job = job();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert!(job.message.is_none());
        assert!(job.error.is_none());
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut job = job();

        job.apply(JobPatch {
            status: Some(JobStatus::Processing),
            progress: Some(5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(job.status, JobStatus::Processing);

        job.apply(JobPatch {
            status: Some(JobStatus::Completed),
            progress: Some(100),
            finished_at: Some(2000),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.finished_at, Some(2000));
    }

    #[test]
    fn test_pending_cannot_jump_to_completed() {
        let mut job = job();
        let err = job
            .apply(JobPatch {
                status: Some(JobStatus::Completed),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatusTransition { .. }));
    }

    #[test]
    fn test_terminal_job_rejects_all_patches() {
        let mut job = job();
        job.apply(JobPatch {
            status: Some(JobStatus::Processing),
            ..Default::default()
        })
        .unwrap();
        job.apply(JobPatch::failed("boom", 3000)).unwrap();

        let err = job.apply(JobPatch::progress(50)).unwrap_err();
        assert!(matches!(err, DomainError::TerminalJob { .. }));
        assert_eq!(job.progress, 0);
        assert_eq!(job.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_patch_merge_keeps_unspecified_fields() {
        let mut job = job();
        job.apply(JobPatch {
            status: Some(JobStatus::Processing),
            message: Some("Starting...".to_string()),
            ..Default::default()
        })
        .unwrap();

        job.apply(JobPatch::progress(42)).unwrap();
        assert_eq!(job.progress, 42);
        // Message from the earlier patch persists.
        assert_eq!(job.message.as_deref(), Some("Starting..."));
    }

    #[test]
    fn test_progress_is_not_clamped() {
        let mut job = job();
        job.apply(JobPatch {
            status: Some(JobStatus::Processing),
            ..Default::default()
        })
        .unwrap();

        job.apply(JobPatch::progress(70)).unwrap();
        job.apply(JobPatch::progress(5)).unwrap();
        assert_eq!(job.progress, 5);

        job.apply(JobPatch::progress(250)).unwrap();
        assert_eq!(job.progress, 250);
    }

    #[test]
    fn test_job_serialization_round_trip() {
        let job = job();
        let json = serde_json::to_string(&job).expect("serialize");
        assert!(json.contains("\"pending\""));
        let back: Job = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.id, job.id);
        assert_eq!(back.status, job.status);
    }
}
