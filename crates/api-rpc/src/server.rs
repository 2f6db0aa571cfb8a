//! JSON-RPC Server
//!
//! Binds the method handlers and the job-update subscription onto one
//! localhost TCP listener. jsonrpsee serves plain HTTP calls (pollers)
//! and WebSocket connections (subscribers) on the same port.

use std::sync::Arc;

use jsonrpsee::core::StringError;
use jsonrpsee::server::{PendingSubscriptionSink, Server, ServerHandle, SubscriptionMessage};
use jsonrpsee::types::Params;
use jsonrpsee::RpcModule;
use tokio::sync::broadcast;
use tracing::info;

use posterforge_core::application::JobRegistry;
use posterforge_core::error::AppError;

use crate::error::to_rpc_error;
use crate::handler::RpcHandler;
use crate::notifier::BroadcastNotifier;
use crate::types::{GalleryRecentParams, JobParams, JobSnapshot};

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 8640;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
    registry: Arc<JobRegistry>,
    notifier: Arc<BroadcastNotifier>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        handler: RpcHandler,
        registry: Arc<JobRegistry>,
        notifier: Arc<BroadcastNotifier>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
            registry,
            notifier,
        }
    }

    /// Start the JSON-RPC server.
    ///
    /// Security: only binds to localhost by default; fronting proxies
    /// own the public surface (and payment gating).
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server (HTTP + WS)"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let mut module = RpcModule::new(());

        // Register methods
        let handler = self.handler.clone();
        module
            .register_async_method("poster.create.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let request = params.parse()?;
                    handler.create_poster(request).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("job.status.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: JobParams = params.parse()?;
                    handler.job_status(req)
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("gallery.recent.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: GalleryRecentParams = params.parse().unwrap_or_default();
                    handler.gallery_recent(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("theme.list.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.theme_list().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("admin.stats.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.stats() }
            })
            .map_err(|e| e.to_string())?;

        // Live job updates
        let registry = self.registry.clone();
        let notifier = self.notifier.clone();
        module
            .register_subscription(
                "job.subscribe.v1",
                "job.update.v1",
                "job.unsubscribe.v1",
                move |params, pending, _, _| {
                    let registry = registry.clone();
                    let notifier = notifier.clone();
                    async move { run_job_subscription(registry, notifier, params, pending).await }
                },
            )
            .map_err(|e| e.to_string())?;

        info!("JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok(handle)
    }
}

/// One live subscription: current snapshot first, then every hub update
/// for the job id, closing after a terminal update has been relayed.
async fn run_job_subscription(
    registry: Arc<JobRegistry>,
    notifier: Arc<BroadcastNotifier>,
    params: Params<'static>,
    pending: PendingSubscriptionSink,
) -> Result<(), StringError> {
    let req: JobParams = match params.parse() {
        Ok(req) => req,
        Err(e) => {
            pending.reject(e).await;
            return Ok(());
        }
    };

    // Subscribe before snapshotting so no update can slip between the
    // snapshot and the live stream.
    let mut updates = notifier.subscribe();

    let Some(job) = registry.get(&req.job_id) else {
        pending
            .reject(to_rpc_error(AppError::NotFound(format!(
                "Job {} not found",
                req.job_id
            ))))
            .await;
        return Ok(());
    };

    let sink = match pending.accept().await {
        Ok(sink) => sink,
        Err(_) => return Ok(()),
    };

    let snapshot = JobSnapshot::from_job(&job);
    let terminal = snapshot.is_terminal();
    sink.send(SubscriptionMessage::from_json(&snapshot)?).await?;
    if terminal {
        return Ok(());
    }

    loop {
        tokio::select! {
            _ = sink.closed() => break,
            update = updates.recv() => match update {
                Ok(update) if update.job_id == req.job_id => {
                    let terminal = update.is_terminal();
                    if sink
                        .send(SubscriptionMessage::from_json(&update)?)
                        .await
                        .is_err()
                    {
                        break;
                    }
                    // Listeners detach once the job is terminal.
                    if terminal {
                        break;
                    }
                }
                Ok(_) => {}
                // Lagging receivers just miss updates; delivery is
                // best-effort by contract.
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    Ok(())
}
