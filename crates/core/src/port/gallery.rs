// Gallery Recorder Port

use crate::domain::{GalleryEntry, PosterRequest, ThemeDisplay};
use crate::error::Result;
use async_trait::async_trait;

/// Records successful jobs for public listing.
///
/// `record` is invoked at most once per successful job, strictly before
/// the job is marked completed, so anyone reacting to `completed` can
/// already find the entry. A failed gallery write must not fail the job.
#[async_trait]
pub trait GalleryRecorder: Send + Sync {
    async fn record(
        &self,
        job_id: &str,
        request: &PosterRequest,
        theme: &ThemeDisplay,
    ) -> Result<GalleryEntry>;

    /// Most recent entries, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<GalleryEntry>>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    /// In-memory gallery, newest entry first.
    #[derive(Default)]
    pub struct MemoryGallery {
        entries: Mutex<Vec<GalleryEntry>>,
        clock: AtomicI64,
    }

    impl MemoryGallery {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn entries(&self) -> Vec<GalleryEntry> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GalleryRecorder for MemoryGallery {
        async fn record(
            &self,
            job_id: &str,
            request: &PosterRequest,
            theme: &ThemeDisplay,
        ) -> Result<GalleryEntry> {
            let entry = GalleryEntry {
                job_id: job_id.to_string(),
                city: request.city.clone(),
                state: request.state.clone(),
                country: request.country.clone(),
                theme: request.theme.clone(),
                theme_name: theme.name.clone(),
                bg_color: theme.bg.clone(),
                text_color: theme.text.clone(),
                created_at: self.clock.fetch_add(1, Ordering::SeqCst),
            };
            self.entries.lock().unwrap().insert(0, entry.clone());
            Ok(entry)
        }

        async fn recent(&self, limit: usize) -> Result<Vec<GalleryEntry>> {
            let mut entries = self.entries();
            entries.truncate(limit);
            Ok(entries)
        }
    }

    /// Gallery whose writes always fail, for non-fatal-failure tests.
    pub struct FailingGallery;

    #[async_trait]
    impl GalleryRecorder for FailingGallery {
        async fn record(
            &self,
            _job_id: &str,
            _request: &PosterRequest,
            _theme: &ThemeDisplay,
        ) -> Result<GalleryEntry> {
            Err(AppError::Internal("gallery unavailable".to_string()))
        }

        async fn recent(&self, _limit: usize) -> Result<Vec<GalleryEntry>> {
            Ok(Vec::new())
        }
    }
}
