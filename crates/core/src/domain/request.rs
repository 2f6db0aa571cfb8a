// Poster Request Model

use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};

/// Theme applied when the caller does not pick one.
pub const DEFAULT_THEME: &str = "feature_based";

const MAX_FIELD_LEN: usize = 100;
const MIN_DISTANCE_M: u32 = 1_000;
const MAX_DISTANCE_M: u32 = 50_000;

/// A poster rendering request as submitted by a caller.
///
/// Extent is controlled by `size` and `distance`; exactly one of them
/// reaches the renderer after extent resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterRequest {
    pub city: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    pub country: String,

    #[serde(default = "default_theme")]
    pub theme: String,

    /// Named size preset; `"auto"` means no explicit choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Explicit render radius in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,

    /// Successful posters are listed publicly unless opted out.
    #[serde(default = "default_show_in_gallery")]
    pub show_in_gallery: bool,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_show_in_gallery() -> bool {
    true
}

impl PosterRequest {
    /// Minimal request with defaults for everything optional.
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: None,
            country: country.into(),
            theme: default_theme(),
            size: None,
            distance: None,
            show_in_gallery: true,
        }
    }

    /// Field-level validation, checked before any job exists.
    pub fn validate(&self) -> Result<()> {
        if self.city.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "city must not be empty".to_string(),
            ));
        }
        if self.city.len() > MAX_FIELD_LEN {
            return Err(DomainError::ValidationError(format!(
                "city exceeds {} characters",
                MAX_FIELD_LEN
            )));
        }
        if self.country.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "country must not be empty".to_string(),
            ));
        }
        if self.country.len() > MAX_FIELD_LEN {
            return Err(DomainError::ValidationError(format!(
                "country exceeds {} characters",
                MAX_FIELD_LEN
            )));
        }
        if let Some(state) = &self.state {
            if state.len() > MAX_FIELD_LEN {
                return Err(DomainError::ValidationError(format!(
                    "state exceeds {} characters",
                    MAX_FIELD_LEN
                )));
            }
        }
        if let Some(distance) = self.distance {
            if !(MIN_DISTANCE_M..=MAX_DISTANCE_M).contains(&distance) {
                return Err(DomainError::ValidationError(format!(
                    "distance must be between {} and {} meters",
                    MIN_DISTANCE_M, MAX_DISTANCE_M
                )));
            }
        }
        Ok(())
    }
}
