// Theme Catalog Port

use crate::domain::{ThemeDisplay, ThemeInfo};
use crate::error::Result;
use async_trait::async_trait;

/// Read-only access to theme metadata.
#[async_trait]
pub trait ThemeCatalog: Send + Sync {
    /// Whether a theme with this id is known.
    async fn exists(&self, theme_id: &str) -> bool;

    /// Display metadata for a theme. Never fails: unknown or unreadable
    /// themes fall back to default colors with the id as the name.
    async fn display_info(&self, theme_id: &str) -> ThemeDisplay;

    /// All available themes.
    async fn list(&self) -> Result<Vec<ThemeInfo>>;
}

pub mod mocks {
    use super::*;

    /// Catalog over a fixed set of themes.
    pub struct StaticThemeCatalog {
        themes: Vec<ThemeInfo>,
    }

    impl StaticThemeCatalog {
        pub fn new(themes: Vec<ThemeInfo>) -> Self {
            Self { themes }
        }

        /// Catalog containing one theme with the given display name.
        pub fn single(id: impl Into<String>, name: impl Into<String>) -> Self {
            let id = id.into();
            Self::new(vec![ThemeInfo {
                id,
                name: name.into(),
                description: None,
                bg: "#1e3a5f".to_string(),
                text: "#e8f0f8".to_string(),
            }])
        }
    }

    #[async_trait]
    impl ThemeCatalog for StaticThemeCatalog {
        async fn exists(&self, theme_id: &str) -> bool {
            self.themes.iter().any(|theme| theme.id == theme_id)
        }

        async fn display_info(&self, theme_id: &str) -> ThemeDisplay {
            self.themes
                .iter()
                .find(|theme| theme.id == theme_id)
                .map(|theme| ThemeDisplay {
                    name: theme.name.clone(),
                    bg: theme.bg.clone(),
                    text: theme.text.clone(),
                })
                .unwrap_or_else(|| ThemeDisplay::fallback(theme_id))
        }

        async fn list(&self) -> Result<Vec<ThemeInfo>> {
            Ok(self.themes.clone())
        }
    }
}
