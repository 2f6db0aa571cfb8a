// Posterforge Core - Domain Logic & Ports
// No infrastructure dependencies: process spawning, filesystem and RPC
// live in the adapter crates.

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
