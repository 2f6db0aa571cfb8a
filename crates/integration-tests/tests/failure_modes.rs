// Failure paths: timeout precedence, diagnostic cleanup, launch
// failures, and the gallery opt-out.

use std::sync::Arc;
use std::time::Duration;

use posterforge_core::application::{
    JobRegistry, RenderConfig, RenderSupervisor, TIMEOUT_ERROR,
};
use posterforge_core::domain::{JobStatus, PosterRequest};
use posterforge_core::port::gallery::mocks::{FailingGallery, MemoryGallery};
use posterforge_core::port::notifier::mocks::RecordingNotifier;
use posterforge_core::port::renderer::mocks::{FailingLauncher, ScriptedLauncher, Step};
use posterforge_core::port::theme_catalog::mocks::StaticThemeCatalog;
use posterforge_core::port::time_provider::SystemTimeProvider;
use posterforge_core::port::{RenderEvent, RenderLauncher};

fn stdout(line: &str) -> Step {
    Step::Emit(RenderEvent::Stdout(line.to_string()))
}

fn stderr(chunk: &str) -> Step {
    Step::Emit(RenderEvent::Stderr(chunk.to_string()))
}

fn exited(code: i32) -> Step {
    Step::Emit(RenderEvent::Exited(Some(code)))
}

struct Harness {
    registry: Arc<JobRegistry>,
    notifier: Arc<RecordingNotifier>,
    gallery: Arc<MemoryGallery>,
    supervisor: RenderSupervisor,
}

fn harness(launcher: Arc<dyn RenderLauncher>, timeout: Duration) -> Harness {
    let notifier = Arc::new(RecordingNotifier::new());
    let gallery = Arc::new(MemoryGallery::new());
    let registry = Arc::new(JobRegistry::new(notifier.clone()));
    let mut config = RenderConfig::new("/tmp/posterforge-test");
    config.timeout = timeout;
    let supervisor = RenderSupervisor::new(
        registry.clone(),
        launcher,
        gallery.clone(),
        Arc::new(StaticThemeCatalog::single("feature_based", "Feature Based")),
        Arc::new(SystemTimeProvider),
        config,
    );
    Harness {
        registry,
        notifier,
        gallery,
        supervisor,
    }
}

#[tokio::test]
async fn test_timeout_kills_job_with_fixed_message() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![
        stdout("Rendering layers"),
        Step::Stall,
    ]));
    let h = harness(launcher.clone(), Duration::from_millis(50));

    let request = PosterRequest::new("Tokyo", "Japan");
    h.registry.create("job-1", 1000, request.clone()).unwrap();
    h.supervisor.run("job-1", &request).await;

    let job = h.registry.get("job-1").unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some(TIMEOUT_ERROR));
    assert_eq!(launcher.termination_count(), 1);
    assert!(h.gallery.entries().is_empty());
}

#[tokio::test]
async fn test_late_exit_after_timeout_is_ignored() {
    // The process "exits cleanly" long after the timeout has fired; the
    // timeout must win the race and the job must stay failed.
    let launcher = Arc::new(ScriptedLauncher::new(vec![
        Step::Sleep(Duration::from_millis(200)),
        exited(0),
    ]));
    let h = harness(launcher, Duration::from_millis(20));

    let request = PosterRequest::new("Tokyo", "Japan");
    h.registry.create("job-1", 1000, request.clone()).unwrap();
    h.supervisor.run("job-1", &request).await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    let job = h.registry.get("job-1").unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some(TIMEOUT_ERROR));
    assert!(h.gallery.entries().is_empty());

    let snapshots = h.notifier.snapshots_for("job-1");
    assert!(snapshots
        .iter()
        .all(|snapshot| snapshot.status != JobStatus::Completed));
    let failed_count = snapshots
        .iter()
        .filter(|snapshot| snapshot.status == JobStatus::Failed)
        .count();
    assert_eq!(failed_count, 1);
}

#[tokio::test]
async fn test_nonzero_exit_reports_cleaned_diagnostics() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![
        stderr(" 45%|████████        | 45/100\n"),
        stderr("\rretrying tile download\n"),
        stderr("Traceback (most recent call last):\n"),
        stderr("ValueError: city not found\n"),
        exited(1),
    ]));
    let h = harness(launcher, Duration::from_secs(5));

    let request = PosterRequest::new("Atlantis", "Nowhere");
    h.registry.create("job-1", 1000, request.clone()).unwrap();
    h.supervisor.run("job-1", &request).await;

    let job = h.registry.get("job-1").unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let error = job.error.unwrap();
    assert_eq!(
        error,
        "Traceback (most recent call last):\nValueError: city not found"
    );
    assert!(!error.contains('\r'));
    assert!(!error.contains('|'));
    assert!(h.gallery.entries().is_empty());
}

#[tokio::test]
async fn test_nonzero_exit_with_silent_stderr_falls_back() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![exited(3)]));
    let h = harness(launcher, Duration::from_secs(5));

    let request = PosterRequest::new("Tokyo", "Japan");
    h.registry.create("job-1", 1000, request.clone()).unwrap();
    h.supervisor.run("job-1", &request).await;

    let job = h.registry.get("job-1").unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(
        job.error.as_deref(),
        Some("Render process exited with code 3")
    );
}

#[tokio::test]
async fn test_stream_closing_without_exit_is_a_failure() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![stdout("Rendering")]));
    let h = harness(launcher, Duration::from_secs(5));

    let request = PosterRequest::new("Tokyo", "Japan");
    h.registry.create("job-1", 1000, request.clone()).unwrap();
    h.supervisor.run("job-1", &request).await;

    let job = h.registry.get("job-1").unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(
        job.error.as_deref(),
        Some("Render process terminated by signal")
    );
}

#[tokio::test]
async fn test_launch_failure_fails_job_with_spawn_error() {
    let launcher = Arc::new(FailingLauncher::new("No such file or directory (os error 2)"));
    let h = harness(launcher, Duration::from_secs(5));

    let request = PosterRequest::new("Tokyo", "Japan");
    h.registry.create("job-1", 1000, request.clone()).unwrap();
    h.supervisor.run("job-1", &request).await;

    let job = h.registry.get("job-1").unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job
        .error
        .unwrap()
        .contains("No such file or directory (os error 2)"));

    // The job went through processing before failing.
    let statuses: Vec<JobStatus> = h
        .notifier
        .snapshots_for("job-1")
        .iter()
        .map(|snapshot| snapshot.status)
        .collect();
    assert_eq!(statuses, vec![JobStatus::Processing, JobStatus::Failed]);
}

#[tokio::test]
async fn test_gallery_opt_out_skips_recording() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![exited(0)]));
    let h = harness(launcher, Duration::from_secs(5));

    let mut request = PosterRequest::new("Tokyo", "Japan");
    request.show_in_gallery = false;
    h.registry.create("job-1", 1000, request.clone()).unwrap();
    h.supervisor.run("job-1", &request).await;

    let job = h.registry.get("job-1").unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(h.gallery.entries().is_empty());
}

#[tokio::test]
async fn test_gallery_failure_does_not_fail_job() {
    let launcher = Arc::new(ScriptedLauncher::new(vec![exited(0)]));
    let notifier = Arc::new(RecordingNotifier::new());
    let registry = Arc::new(JobRegistry::new(notifier.clone()));
    let supervisor = RenderSupervisor::new(
        registry.clone(),
        launcher,
        Arc::new(FailingGallery),
        Arc::new(StaticThemeCatalog::single("feature_based", "Feature Based")),
        Arc::new(SystemTimeProvider),
        RenderConfig::new("/tmp/posterforge-test"),
    );

    let request = PosterRequest::new("Tokyo", "Japan");
    registry.create("job-1", 1000, request.clone()).unwrap();
    supervisor.run("job-1", &request).await;

    let job = registry.get("job-1").unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.error.is_none());
}
