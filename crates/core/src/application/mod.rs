// Application Layer - Job registry and render supervision

pub mod registry;
pub mod supervisor;

// Re-exports
pub use registry::JobRegistry;
pub use supervisor::{RenderConfig, RenderSupervisor, RENDER_TIMEOUT, TIMEOUT_ERROR};
