//! Posterforge - Main Entry Point
//! Composition root: wires the registry, the render supervisor, the
//! store adapters and the RPC transport together.

mod telemetry;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Import workspace crates
use posterforge_api_rpc::{BroadcastNotifier, RpcHandler, RpcServer, RpcServerConfig};
use posterforge_core::application::{JobRegistry, RenderConfig, RenderSupervisor};
use posterforge_core::port::id_provider::UuidProvider;
use posterforge_core::port::time_provider::SystemTimeProvider;
use posterforge_infra_render::{PosterRenderLauncher, RendererConfig};
use posterforge_infra_store::{FileThemeCatalog, JsonFileGallery};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_DATA_DIR: &str = "./data/posters";
const DEFAULT_GALLERY_FILE: &str = "./data/gallery.json";
const DEFAULT_THEMES_DIR: &str = "./themes";
const DEFAULT_RENDERER_CMD: &str = "python3";
const DEFAULT_RENDERER_SCRIPT: &str = "./create_map_poster.py";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (pretty for development, JSON for
    // production), with the optional OTLP layer stacked in.
    let log_format =
        std::env::var("POSTERFORGE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("posterforge=info"))
        .expect("Failed to create env filter");

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry::otlp_layer()?);
    match log_format.as_str() {
        "json" => subscriber.with(fmt::layer().json()).init(),
        _ => subscriber.with(fmt::layer().pretty()).init(),
    }

    info!("Posterforge v{} starting...", VERSION);

    // 2. Load configuration
    let data_dir = PathBuf::from(env_or("POSTERFORGE_DATA_DIR", DEFAULT_DATA_DIR));
    let gallery_file = PathBuf::from(env_or("POSTERFORGE_GALLERY_FILE", DEFAULT_GALLERY_FILE));
    let themes_dir = PathBuf::from(env_or("POSTERFORGE_THEMES_DIR", DEFAULT_THEMES_DIR));
    let renderer_cmd = env_or("POSTERFORGE_RENDERER_CMD", DEFAULT_RENDERER_CMD);
    let renderer_script =
        PathBuf::from(env_or("POSTERFORGE_RENDERER_SCRIPT", DEFAULT_RENDERER_SCRIPT));

    let mut rpc_config = RpcServerConfig::default();
    if let Some(port) = std::env::var("POSTERFORGE_RPC_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
    {
        rpc_config.port = port;
    }

    info!(
        data_dir = %data_dir.display(),
        themes_dir = %themes_dir.display(),
        renderer = %renderer_cmd,
        "Configuration loaded"
    );

    tokio::fs::create_dir_all(&data_dir).await?;

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let notifier = Arc::new(BroadcastNotifier::new());
    let registry = Arc::new(JobRegistry::new(notifier.clone()));
    let themes = Arc::new(FileThemeCatalog::new(&themes_dir));
    let gallery = Arc::new(JsonFileGallery::new(&gallery_file, time_provider.clone()));

    let working_dir = renderer_script
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let launcher = Arc::new(PosterRenderLauncher::new(RendererConfig {
        command: renderer_cmd,
        script: renderer_script,
        working_dir,
    }));

    let supervisor = Arc::new(RenderSupervisor::new(
        registry.clone(),
        launcher,
        gallery.clone(),
        themes.clone(),
        time_provider.clone(),
        RenderConfig::new(&data_dir),
    ));

    // 4. Start JSON-RPC server (HTTP pollers + WS subscribers)
    info!("Starting JSON-RPC server...");
    let handler = RpcHandler::new(
        registry.clone(),
        supervisor,
        gallery,
        themes,
        id_provider,
        time_provider,
    );
    let rpc_server = RpcServer::new(rpc_config, handler, registry, notifier);
    let rpc_handle = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!("System ready. Waiting for poster requests...");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown. In-flight renderers die with the process;
    // job history is in-memory by design and not preserved.
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;

    info!("Shutdown complete.");

    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
