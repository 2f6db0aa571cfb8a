// Domain Layer - Pure business logic and entities

pub mod error;
pub mod gallery;
pub mod job;
pub mod request;

// Re-exports
pub use error::DomainError;
pub use gallery::{GalleryEntry, ThemeDisplay, ThemeInfo};
pub use job::{Job, JobId, JobPatch, JobStatus};
pub use request::{PosterRequest, DEFAULT_THEME};
