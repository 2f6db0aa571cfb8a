//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for Posterforge. One localhost
//! port serves HTTP method calls (pollers) and WebSocket subscriptions
//! (live job updates).

pub mod error;
pub mod handler;
pub mod notifier;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use notifier::BroadcastNotifier;
pub use server::{RpcServer, RpcServerConfig};
