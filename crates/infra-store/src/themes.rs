// File-backed theme catalog - one JSON document per theme.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use posterforge_core::domain::{ThemeDisplay, ThemeInfo};
use posterforge_core::error::Result;
use posterforge_core::port::ThemeCatalog;

#[derive(Debug, Deserialize)]
struct ThemeFile {
    name: Option<String>,
    description: Option<String>,
    bg: Option<String>,
    text: Option<String>,
}

/// Catalog over `<themes_dir>/<id>.json` documents.
pub struct FileThemeCatalog {
    themes_dir: PathBuf,
}

impl FileThemeCatalog {
    pub fn new(themes_dir: impl Into<PathBuf>) -> Self {
        Self {
            themes_dir: themes_dir.into(),
        }
    }

    fn theme_path(&self, theme_id: &str) -> PathBuf {
        self.themes_dir.join(format!("{}.json", theme_id))
    }

    async fn read_theme(&self, theme_id: &str) -> Option<ThemeFile> {
        let bytes = tokio::fs::read(self.theme_path(theme_id)).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(theme = %theme_id, error = %e, "malformed theme file");
                None
            }
        }
    }

    fn to_info(theme_id: String, file: Option<ThemeFile>) -> ThemeInfo {
        let fallback = ThemeDisplay::fallback(&theme_id);
        match file {
            Some(file) => ThemeInfo {
                id: theme_id,
                name: file.name.unwrap_or(fallback.name),
                description: file.description,
                bg: file.bg.unwrap_or(fallback.bg),
                text: file.text.unwrap_or(fallback.text),
            },
            None => ThemeInfo {
                id: theme_id,
                name: fallback.name,
                description: None,
                bg: fallback.bg,
                text: fallback.text,
            },
        }
    }
}

#[async_trait]
impl ThemeCatalog for FileThemeCatalog {
    async fn exists(&self, theme_id: &str) -> bool {
        tokio::fs::try_exists(self.theme_path(theme_id))
            .await
            .unwrap_or(false)
    }

    async fn display_info(&self, theme_id: &str) -> ThemeDisplay {
        let info = Self::to_info(theme_id.to_string(), self.read_theme(theme_id).await);
        ThemeDisplay {
            name: info.name,
            bg: info.bg,
            text: info.text,
        }
    }

    async fn list(&self) -> Result<Vec<ThemeInfo>> {
        let mut themes = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.themes_dir).await?;
        while let Some(dir_entry) = dir.next_entry().await? {
            let path = dir_entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let file = self.read_theme(id).await;
            themes.push(Self::to_info(id.to_string(), file));
        }
        themes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(themes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_catalog() -> (FileThemeCatalog, PathBuf) {
        let dir = std::env::temp_dir().join(format!("posterforge-themes-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        (FileThemeCatalog::new(&dir), dir)
    }

    #[tokio::test]
    async fn test_display_info_reads_theme_file() {
        let (catalog, dir) = temp_catalog().await;
        tokio::fs::write(
            dir.join("noir.json"),
            br##"{"name": "Noir", "bg": "#111111", "text": "#eeeeee"}"##,
        )
        .await
        .unwrap();

        assert!(catalog.exists("noir").await);
        let display = catalog.display_info("noir").await;
        assert_eq!(display.name, "Noir");
        assert_eq!(display.bg, "#111111");
        assert_eq!(display.text, "#eeeeee");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_unknown_theme_falls_back() {
        let (catalog, dir) = temp_catalog().await;

        assert!(!catalog.exists("missing").await);
        let display = catalog.display_info("missing").await;
        assert_eq!(display.name, "missing");
        assert_eq!(display.bg, "#0a0a0a");
        assert_eq!(display.text, "#f5f0e8");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_malformed_theme_falls_back() {
        let (catalog, dir) = temp_catalog().await;
        tokio::fs::write(dir.join("broken.json"), b"{not json").await.unwrap();

        let display = catalog.display_info("broken").await;
        assert_eq!(display.name, "broken");
        assert_eq!(display.bg, "#0a0a0a");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_json_only() {
        let (catalog, dir) = temp_catalog().await;
        tokio::fs::write(dir.join("sunset.json"), br#"{"name": "Sunset"}"#)
            .await
            .unwrap();
        tokio::fs::write(dir.join("blueprint.json"), br#"{"name": "Blueprint"}"#)
            .await
            .unwrap();
        tokio::fs::write(dir.join("readme.txt"), b"ignore me").await.unwrap();

        let themes = catalog.list().await.unwrap();
        assert_eq!(themes.len(), 2);
        assert_eq!(themes[0].id, "blueprint");
        assert_eq!(themes[1].id, "sunset");
        assert_eq!(themes[0].name, "Blueprint");
        // Missing colors fall back.
        assert_eq!(themes[0].bg, "#0a0a0a");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
