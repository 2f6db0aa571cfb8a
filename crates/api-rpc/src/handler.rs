//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use std::sync::Arc;
use std::time::Instant;

use jsonrpsee::types::ErrorObjectOwned;
use tracing::info;

use posterforge_core::application::{JobRegistry, RenderSupervisor};
use posterforge_core::domain::{JobStatus, PosterRequest};
use posterforge_core::error::AppError;
use posterforge_core::port::{GalleryRecorder, IdProvider, ThemeCatalog, TimeProvider};

use crate::error::{throttled, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    CreatePosterResponse, GalleryRecentParams, GalleryRecentResponse, JobParams, JobSnapshot,
    StatsResponse, ThemeListResponse,
};

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    registry: Arc<JobRegistry>,
    supervisor: Arc<RenderSupervisor>,
    gallery: Arc<dyn GalleryRecorder>,
    themes: Arc<dyn ThemeCatalog>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    rate_limiter: RateLimiter,
    start_time: Instant,
}

impl RpcHandler {
    pub fn new(
        registry: Arc<JobRegistry>,
        supervisor: Arc<RenderSupervisor>,
        gallery: Arc<dyn GalleryRecorder>,
        themes: Arc<dyn ThemeCatalog>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        // Default: 200 burst, 100 req/sec (configurable via env)
        let burst = env_u32("POSTERFORGE_RATE_LIMIT_BURST", 200);
        let rate = env_u32("POSTERFORGE_RATE_LIMIT_RATE", 100);

        Self {
            registry,
            supervisor,
            gallery,
            themes,
            id_provider,
            time_provider,
            rate_limiter: RateLimiter::new(burst, rate),
            start_time: Instant::now(),
        }
    }

    /// poster.create.v1
    pub async fn create_poster(
        &self,
        request: PosterRequest,
    ) -> Result<CreatePosterResponse, ErrorObjectOwned> {
        if !self.rate_limiter.check().await {
            return Err(throttled());
        }

        // Validation failures surface immediately; no job exists yet.
        request
            .validate()
            .map_err(|e| to_rpc_error(AppError::Domain(e)))?;

        if !self.themes.exists(&request.theme).await {
            return Err(to_rpc_error(AppError::Validation(format!(
                "Theme '{}' not found",
                request.theme
            ))));
        }

        let job_id = self.id_provider.generate_id();
        let created_at = self.time_provider.now_millis();
        self.registry
            .create(job_id.clone(), created_at, request.clone())
            .map_err(to_rpc_error)?;

        // Rendering runs detached; callers follow along by polling
        // job.status.v1 or subscribing.
        let supervisor = Arc::clone(&self.supervisor);
        let spawned_id = job_id.clone();
        tokio::spawn(async move {
            supervisor.run(&spawned_id, &request).await;
        });

        info!(job_id = %job_id, "poster job accepted");

        Ok(CreatePosterResponse {
            job_id,
            status: JobStatus::Pending,
            message: "Poster generation started. Poll job.status.v1 or subscribe with job.subscribe.v1.".to_string(),
        })
    }

    /// job.status.v1
    pub fn job_status(&self, params: JobParams) -> Result<JobSnapshot, ErrorObjectOwned> {
        let job = self.registry.get(&params.job_id).ok_or_else(|| {
            to_rpc_error(AppError::NotFound(format!(
                "Job {} not found",
                params.job_id
            )))
        })?;
        Ok(JobSnapshot::from_job(&job))
    }

    /// gallery.recent.v1
    pub async fn gallery_recent(
        &self,
        params: GalleryRecentParams,
    ) -> Result<GalleryRecentResponse, ErrorObjectOwned> {
        let posters = self
            .gallery
            .recent(params.limit)
            .await
            .map_err(to_rpc_error)?;
        let total = posters.len();
        Ok(GalleryRecentResponse { posters, total })
    }

    /// theme.list.v1
    pub async fn theme_list(&self) -> Result<ThemeListResponse, ErrorObjectOwned> {
        let themes = self.themes.list().await.map_err(to_rpc_error)?;
        Ok(ThemeListResponse { themes })
    }

    /// admin.stats.v1
    pub fn stats(&self) -> Result<StatsResponse, ErrorObjectOwned> {
        Ok(StatsResponse {
            total_jobs: self.registry.len(),
            pending_jobs: self.registry.count_by_status(JobStatus::Pending),
            processing_jobs: self.registry.count_by_status(JobStatus::Processing),
            completed_jobs: self.registry.count_by_status(JobStatus::Completed),
            failed_jobs: self.registry.count_by_status(JobStatus::Failed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        })
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
