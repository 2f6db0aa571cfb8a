// File-backed gallery - one JSON document of recent successful posters.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use posterforge_core::domain::{GalleryEntry, PosterRequest, ThemeDisplay};
use posterforge_core::error::Result;
use posterforge_core::port::{GalleryRecorder, TimeProvider};

/// Upper bound on listed posters; older entries fall off the end.
const MAX_ENTRIES: usize = 12;

#[derive(Debug, Default, Serialize, Deserialize)]
struct GalleryFile {
    entries: Vec<GalleryEntry>,
}

/// Gallery persisted as one JSON document, newest entry first.
pub struct JsonFileGallery {
    path: PathBuf,
    time_provider: Arc<dyn TimeProvider>,
    // One reader-modify-writer at a time; the file is the unit of
    // consistency.
    io_lock: Mutex<()>,
}

impl JsonFileGallery {
    pub fn new(path: impl Into<PathBuf>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            path: path.into(),
            time_provider,
            io_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> GalleryFile {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(file) => file,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "unreadable gallery file, starting empty");
                    GalleryFile::default()
                }
            },
            Err(_) => GalleryFile::default(),
        }
    }

    async fn save(&self, file: &GalleryFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(file)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl GalleryRecorder for JsonFileGallery {
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
            created_at: self.time_provider.now_millis(),
        };

        let _guard = self.io_lock.lock().await;
        let mut file = self.load().await;
        file.entries.insert(0, entry.clone());
        file.entries.truncate(MAX_ENTRIES);
        self.save(&file).await?;

        info!(job_id = %job_id, city = %entry.city, country = %entry.country, "gallery entry recorded");
        Ok(entry)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<GalleryEntry>> {
        let _guard = self.io_lock.lock().await;
        let mut file = self.load().await;
        file.entries.truncate(limit.min(MAX_ENTRIES));
        Ok(file.entries)
    }
}
