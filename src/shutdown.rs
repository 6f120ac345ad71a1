use actix_web::dev::ServerHandle;
use actix_web::web;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::state::AppState;

/// Handles graceful shutdown of the dashboard
///
/// This module orchestrates graceful shutdown by:
/// 1. Listening for shutdown signals (SIGTERM, SIGINT/CTRL+C)
/// 2. Stopping the HTTP server (finishing in-flight page renders)
/// 3. Signaling background tasks to stop
/// 4. Releasing every page subscription held on the cache
pub struct ShutdownCoordinator {
    server_handle: ServerHandle,
    server_task: JoinHandle<Result<(), std::io::Error>>,
    task_handles: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    state: web::Data<AppState>,
}

impl ShutdownCoordinator {
    pub fn new(
        server_handle: ServerHandle,
        server_task: JoinHandle<Result<(), std::io::Error>>,
        task_handles: Vec<JoinHandle<()>>,
        shutdown_tx: watch::Sender<bool>,
        state: web::Data<AppState>,
    ) -> Self {
        Self {
            server_handle,
            server_task,
            task_handles,
            shutdown_tx,
            state,
        }
    }

    /// Wait for CTRL+C or SIGTERM (Unix only), then shut down gracefully
    pub async fn wait_for_shutdown(self) -> Result<(), std::io::Error> {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for CTRL+C: {:?}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM signal handler: {:?}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received CTRL+C signal, initiating graceful shutdown...");
            }
            _ = terminate => {
                info!("Received SIGTERM signal, initiating graceful shutdown...");
            }
        }

        self.shutdown().await
    }

    async fn shutdown(self) -> Result<(), std::io::Error> {
        // 1. Stop HTTP server (stop accepting new requests)
        info!("Stopping HTTP server (no longer accepting new requests)...");
        self.server_handle.stop(true).await;
        info!("HTTP server stopped accepting new requests");

        // 2. Signal background tasks to stop
        info!("Signaling background tasks to stop...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal to background tasks: {:?}", e);
        }

        let num_tasks = self.task_handles.len();
        for (i, handle) in self.task_handles.into_iter().enumerate() {
            match handle.await {
                Ok(()) => info!("Background task {} stopped ({}/{})", i + 1, i + 1, num_tasks),
                Err(e) => error!("Background task {} failed to stop: {:?}", i + 1, e),
            }
        }

        // 3. Wait for HTTP server task to complete
        info!("Waiting for HTTP server to fully shut down...");
        match self.server_task.await {
            Ok(Ok(())) => info!("HTTP server shut down successfully"),
            Ok(Err(e)) => error!("HTTP server encountered error during shutdown: {:?}", e),
            Err(e) => error!("HTTP server task panicked: {:?}", e),
        }

        // 4. Drop page subscriptions so no background refetch outlives the server
        self.state.views.clear();
        info!(
            "Released page subscriptions, {} cache entries left",
            self.state.queries.cache().len()
        );

        info!("Graceful shutdown completed successfully");
        Ok(())
    }
}
