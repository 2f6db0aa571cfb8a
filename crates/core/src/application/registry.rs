// Job Registry - the authoritative in-memory state of every job

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::warn;

use crate::domain::{Job, JobId, JobPatch, JobStatus, PosterRequest};
use crate::error::{AppError, Result};
use crate::port::JobNotifier;

/// Owns the canonical record of every job. Reads hand out clones; every
/// mutation goes through `update`, which merges a patch and then
/// synchronously hands the full resulting snapshot to the notifier.
///
/// The map is sharded, so distinct ids mutate in parallel while each
/// single id is serialized. The notifier runs under the per-id entry
/// lock: for any one job, delivery order equals update order.
pub struct JobRegistry {
    jobs: DashMap<JobId, Job>,
    notifier: Arc<dyn JobNotifier>,
}

impl JobRegistry {
    pub fn new(notifier: Arc<dyn JobNotifier>) -> Self {
        Self {
            jobs: DashMap::new(),
            notifier,
        }
    }

    /// Create a new job in `pending`. Fails if the id is already taken.
    pub fn create(
        &self,
        id: impl Into<JobId>,
        created_at: i64,
        request: PosterRequest,
    ) -> Result<Job> {
        let id = id.into();
        match self.jobs.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(AppError::Conflict(format!("job {} already exists", id)))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let job = Job::new(id, created_at, request);
                entry.insert(job.clone());
                Ok(job)
            }
        }
    }

    /// Point-in-time snapshot; no side effects.
    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    /// Merge `patch` into the record and notify with the full result.
    ///
    /// The sink contract is non-blocking; a panicking sink is contained
    /// here so delivery failures can never corrupt or fail the update.
    pub fn update(&self, id: &str, patch: JobPatch) -> Result<Job> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("job {} not found", id)))?;
        entry.value_mut().apply(patch)?;
        let snapshot = entry.value().clone();

        if catch_unwind(AssertUnwindSafe(|| self.notifier.notify(&snapshot))).is_err() {
            warn!(job_id = %id, "notification sink panicked; update kept");
        }

        Ok(snapshot)
    }

    /// Number of jobs currently in `status`.
    pub fn count_by_status(&self, status: JobStatus) -> usize {
        self.jobs
            .iter()
            .filter(|entry| entry.value().status == status)
            .count()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
