// Render Supervisor - drives one job through its state machine while an
// external renderer process runs.

mod diagnostics;
mod invocation;
mod progress;

pub use invocation::{build_invocation, resolve_extent, DEFAULT_SIZE_PRESET};
pub use progress::updates_for_line;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::application::registry::JobRegistry;
use crate::domain::{JobPatch, JobStatus, PosterRequest};
use crate::port::{GalleryRecorder, RenderEvent, RenderLauncher, ThemeCatalog, TimeProvider};
use diagnostics::DiagnosticBuffer;

/// Hard per-job wall-clock limit for the external renderer.
pub const RENDER_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Fixed error text for timed-out jobs. Independent of the configured
/// timeout so observers can match on it.
pub const TIMEOUT_ERROR: &str = "Generation timed out after 5 minutes";

const STARTING_PROGRESS: u32 = 5;
const STARTING_MESSAGE: &str = "Starting...";
const COMPLETED_MESSAGE: &str = "Poster generated successfully!";

/// Supervisor configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Directory the renderer writes finished posters into.
    pub output_dir: PathBuf,
    /// Wall-clock limit for one render.
    pub timeout: Duration,
}

impl RenderConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            timeout: RENDER_TIMEOUT,
        }
    }
}

/// Supervises the external renderer for one job at a time: builds its
/// invocation, streams its output into the registry, enforces the
/// timeout, and performs the gallery side effect before the terminal
/// transition. Jobs run concurrently by spawning `run` per job.
pub struct RenderSupervisor {
    registry: Arc<JobRegistry>,
    launcher: Arc<dyn RenderLauncher>,
    gallery: Arc<dyn GalleryRecorder>,
    themes: Arc<dyn ThemeCatalog>,
    time_provider: Arc<dyn TimeProvider>,
    config: RenderConfig,
}

impl RenderSupervisor {
    pub fn new(
        registry: Arc<JobRegistry>,
        launcher: Arc<dyn RenderLauncher>,
        gallery: Arc<dyn GalleryRecorder>,
        themes: Arc<dyn ThemeCatalog>,
        time_provider: Arc<dyn TimeProvider>,
        config: RenderConfig,
    ) -> Self {
        Self {
            registry,
            launcher,
            gallery,
            themes,
            time_provider,
            config,
        }
    }

    /// Drive one job from `pending` to a terminal status.
    ///
    /// Every renderer-side failure is captured into the job record;
    /// callers only ever observe failures through `status`/`error`.
    pub async fn run(&self, job_id: &str, request: &PosterRequest) {
        let output_path = self.config.output_dir.join(format!("{}.png", job_id));
        let invocation = invocation::build_invocation(request, &output_path);

        if let Err(e) = self.registry.update(
            job_id,
            JobPatch {
                status: Some(JobStatus::Processing),
                progress: Some(STARTING_PROGRESS),
                message: Some(STARTING_MESSAGE.to_string()),
                ..Default::default()
            },
        ) {
            error!(job_id = %job_id, error = %e, "failed to enter processing");
            return;
        }

        info!(
            job_id = %job_id,
            city = %request.city,
            country = %request.country,
            theme = %request.theme,
            extent = ?invocation.extent,
            "launching renderer"
        );

        let mut process = match self.launcher.launch(&invocation).await {
            Ok(process) => process,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "renderer failed to start");
                self.fail(job_id, e.to_string());
                return;
            }
        };

        let mut diagnostics = DiagnosticBuffer::new();
        let timeout = tokio::time::sleep(self.config.timeout);
        tokio::pin!(timeout);

        loop {
            tokio::select! {
                _ = &mut timeout => {
                    // Timeout wins the race: kill the renderer, fail the
                    // job, and drop the stream so any late exit event is
                    // ignored.
                    warn!(job_id = %job_id, "renderer killed after timeout");
                    process.terminate().await;
                    self.fail(job_id, TIMEOUT_ERROR.to_string());
                    return;
                }
                event = process.next_event() => match event {
                    Some(RenderEvent::Stdout(line)) => {
                        info!(job_id = %job_id, line = %line.trim_end(), "renderer");
                        for patch in progress::updates_for_line(&line) {
                            self.apply(job_id, patch);
                        }
                    }
                    Some(RenderEvent::Stderr(chunk)) => {
                        diagnostics.push_chunk(job_id, &chunk);
                    }
                    Some(RenderEvent::Exited(code)) => {
                        self.finish(job_id, request, &invocation.output_path, code, &diagnostics)
                            .await;
                        return;
                    }
                    None => {
                        // Stream closed without an exit event; classify
                        // like a signal death.
                        self.finish(job_id, request, &invocation.output_path, None, &diagnostics)
                            .await;
                        return;
                    }
                }
            }
        }
    }

    async fn finish(
        &self,
        job_id: &str,
        request: &PosterRequest,
        output_path: &str,
        code: Option<i32>,
        diagnostics: &DiagnosticBuffer,
    ) {
        if code == Some(0) {
            if request.show_in_gallery {
                // Record the gallery entry before the completed
                // transition so anyone reacting to `completed` can
                // already find it.
                let display = self.themes.display_info(&request.theme).await;
                if let Err(e) = self.gallery.record(job_id, request, &display).await {
                    warn!(job_id = %job_id, error = %e, "gallery record failed");
                }
            }

            info!(job_id = %job_id, output = %output_path, "render completed");
            self.apply(
                job_id,
                JobPatch {
                    status: Some(JobStatus::Completed),
                    progress: Some(100),
                    message: Some(COMPLETED_MESSAGE.to_string()),
                    result_path: Some(output_path.to_string()),
                    finished_at: Some(self.time_provider.now_millis()),
                    ..Default::default()
                },
            );
        } else {
            let error_text = diagnostics.final_error(code);
            error!(job_id = %job_id, exit_code = ?code, error = %error_text, "render failed");
            self.fail(job_id, error_text);
        }
    }

    fn fail(&self, job_id: &str, error_text: String) {
        self.apply(
            job_id,
            JobPatch::failed(error_text, self.time_provider.now_millis()),
        );
    }

    fn apply(&self, job_id: &str, patch: JobPatch) {
        if let Err(e) = self.registry.update(job_id, patch) {
            warn!(job_id = %job_id, error = %e, "dropped job update");
        }
    }
}
