//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use serde::{Deserialize, Serialize};

use posterforge_core::domain::{GalleryEntry, Job, JobStatus, ThemeInfo};

/// poster.create.v1 result. The request params are the domain
/// `PosterRequest` itself.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePosterResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
}

/// job.status.v1 / job.subscribe.v1 params
#[derive(Debug, Deserialize)]
pub struct JobParams {
    pub job_id: String,
}

/// Client-facing job snapshot, shared by poll responses and
/// subscription notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Present only once the poster is downloadable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl JobSnapshot {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            status: job.status,
            progress: job.progress,
            message: job.message.clone(),
            error: job.error.clone(),
            download_url: download_url(&job.id, job.status),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Download reference for a finished poster, derived from the job id.
pub fn download_url(job_id: &str, status: JobStatus) -> Option<String> {
    (status == JobStatus::Completed).then(|| format!("/api/posters/{}", job_id))
}

/// gallery.recent.v1 params
#[derive(Debug, Deserialize)]
pub struct GalleryRecentParams {
    #[serde(default = "default_gallery_limit")]
    pub limit: usize,
}

impl Default for GalleryRecentParams {
    fn default() -> Self {
        Self {
            limit: default_gallery_limit(),
        }
    }
}

fn default_gallery_limit() -> usize {
    12
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryRecentResponse {
    pub posters: Vec<GalleryEntry>,
    pub total: usize,
}

/// theme.list.v1 result
#[derive(Debug, Clone, Serialize)]
pub struct ThemeListResponse {
    pub themes: Vec<ThemeInfo>,
}

/// admin.stats.v1 result
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_jobs: usize,
    pub pending_jobs: usize,
    pub processing_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub uptime_seconds: u64,
}
