// Port Layer - Interfaces for external dependencies

pub mod gallery;
pub mod id_provider;
pub mod notifier;
pub mod renderer;
pub mod theme_catalog;
pub mod time_provider;

// Re-exports
pub use gallery::GalleryRecorder;
pub use id_provider::IdProvider;
pub use notifier::{JobNotifier, NoopNotifier};
pub use renderer::{
    RenderError, RenderEvent, RenderExtent, RenderInvocation, RenderLauncher, RenderProcess,
};
pub use theme_catalog::ThemeCatalog;
pub use time_provider::TimeProvider;
