// Gallery and Theme Display Models

use serde::{Deserialize, Serialize};

/// Background color used when a theme carries no display metadata.
pub const FALLBACK_BG: &str = "#0a0a0a";
/// Text color used when a theme carries no display metadata.
pub const FALLBACK_TEXT: &str = "#f5f0e8";

/// Display metadata for a theme, used to style gallery cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDisplay {
    pub name: String,
    pub bg: String,
    pub text: String,
}

impl ThemeDisplay {
    /// Display info for a theme with missing or unreadable metadata:
    /// the id doubles as the name.
    pub fn fallback(theme_id: &str) -> Self {
        Self {
            name: theme_id.to_string(),
            bg: FALLBACK_BG.to_string(),
            text: FALLBACK_TEXT.to_string(),
        }
    }
}

/// Theme metadata exposed by the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub bg: String,
    pub text: String,
}

/// Denormalized record of a successful job kept for public listing,
/// independent of the job record itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub job_id: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub country: String,
    pub theme: String,
    pub theme_name: String,
    pub bg_color: String,
    pub text_color: String,
    pub created_at: i64, // epoch ms
}
