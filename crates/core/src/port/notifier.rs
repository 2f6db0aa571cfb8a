// Job Notifier Port
// The indirection point that lets transports observe registry updates
// without the registry knowing about sockets or polling.

use crate::domain::Job;

/// Delivery sink invoked by the registry after every successful update.
///
/// Contract: `notify` is fire-and-forget and must return promptly; a
/// slow or failing consumer must never block or fail the update that
/// triggered it. Implementations swallow their own delivery errors, and
/// the registry additionally contains panics.
pub trait JobNotifier: Send + Sync {
    /// Deliver a full, self-consistent snapshot of the job.
    fn notify(&self, job: &Job);
}

/// Sink used when no transport is attached: every update is a no-op,
/// never an error.
pub struct NoopNotifier;

impl JobNotifier for NoopNotifier {
    fn notify(&self, _job: &Job) {}
}

pub mod mocks {
    use super::JobNotifier;
    use crate::domain::Job;
    use std::sync::Mutex;

    /// Records every snapshot it receives, in delivery order.
    #[derive(Default)]
    pub struct RecordingNotifier {
        snapshots: Mutex<Vec<Job>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn snapshots(&self) -> Vec<Job> {
            self.snapshots.lock().unwrap().clone()
        }

        /// Snapshots delivered for one job id, in order.
        pub fn snapshots_for(&self, job_id: &str) -> Vec<Job> {
            self.snapshots
                .lock()
                .unwrap()
                .iter()
                .filter(|job| job.id == job_id)
                .cloned()
                .collect()
        }
    }

    impl JobNotifier for RecordingNotifier {
        fn notify(&self, job: &Job) {
            self.snapshots.lock().unwrap().push(job.clone());
        }
    }

    /// Sink that panics on every delivery, for isolation tests.
    pub struct PanickingNotifier;

    impl JobNotifier for PanickingNotifier {
        fn notify(&self, _job: &Job) {
            panic!("notification sink blew up");
        }
    }
}
