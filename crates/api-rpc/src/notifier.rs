//! Broadcast-backed notification hub.
//!
//! The registry sees exactly one sink; every live subscription holds its
//! own broadcast receiver and filters by job id. With zero receivers a
//! send is silently dropped, which is exactly the "no observers" no-op
//! the pipeline requires.

use tokio::sync::broadcast;

use posterforge_core::domain::Job;
use posterforge_core::port::JobNotifier;

use crate::types::JobSnapshot;

/// Buffered updates per receiver before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 256;

pub struct BroadcastNotifier {
    sender: broadcast::Sender<JobSnapshot>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobSnapshot> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl JobNotifier for BroadcastNotifier {
    fn notify(&self, job: &Job) {
        // A send error only means there are zero receivers right now.
        let _ = self.sender.send(JobSnapshot::from_job(job));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posterforge_core::domain::{JobPatch, JobStatus, PosterRequest};

    fn job(id: &str) -> Job {
        Job::new(id, 1000, PosterRequest::new("Tokyo", "Japan"))
    }

    #[test]
    fn test_notify_without_receivers_is_a_noop() {
        let notifier = BroadcastNotifier::new();
        notifier.notify(&job("job-1"));
    }

    #[tokio::test]
    async fn test_subscribers_receive_snapshots_in_order() {
        let notifier = BroadcastNotifier::new();
        let mut rx = notifier.subscribe();

        let mut job = job("job-1");
        job.apply(JobPatch {
            status: Some(JobStatus::Processing),
            progress: Some(5),
            ..Default::default()
        })
        .unwrap();
        notifier.notify(&job);
        job.apply(JobPatch::progress(40)).unwrap();
        notifier.notify(&job);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.progress, 5);
        assert_eq!(second.progress, 40);
        assert_eq!(first.job_id, "job-1");
        assert!(first.download_url.is_none());
    }

    #[tokio::test]
    async fn test_completed_snapshot_carries_download_url() {
        let notifier = BroadcastNotifier::new();
        let mut rx = notifier.subscribe();

        let mut job = job("job-9");
        job.apply(JobPatch {
            status: Some(JobStatus::Processing),
            ..Default::default()
        })
        .unwrap();
        job.apply(JobPatch {
            status: Some(JobStatus::Completed),
            progress: Some(100),
            ..Default::default()
        })
        .unwrap();
        notifier.notify(&job);

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.download_url.as_deref(), Some("/api/posters/job-9"));
    }
}
