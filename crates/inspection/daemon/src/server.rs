//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};
use crate::storage::{InMemoryStorage, PostgresStorage, Storage};
use inspection_engine::{BlobStore, FsBlobStore};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Inspection daemon server
pub struct Server {
    config: DaemonConfig,
    state: AppState,
}

impl Server {
    /// Connect storage, prepare the evidence directory and wire services
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let store: Arc<dyn Storage> = match &config.storage {
            StorageConfig::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Arc::new(InMemoryStorage::new())
            }
            StorageConfig::Postgres {
                url,
                max_connections,
                connect_timeout_secs,
            } => Arc::new(PostgresStorage::new(url, *max_connections, *connect_timeout_secs).await?),
        };

        tokio::fs::create_dir_all(&config.evidence.root_dir).await?;
        let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(config.evidence.root_dir.clone()));

        let state = AppState::new(store, blobs, config.engine());

        if let Some(bootstrap) = &config.bootstrap {
            let created = state
                .catalog
                .bootstrap_admin(&bootstrap.name, &bootstrap.email)
                .await
                .map_err(|e| DaemonError::Config(format!("bootstrap admin: {e}")))?;
            if let Some(admin) = created {
                tracing::info!(user_id = %admin.id, email = %admin.email, "Bootstrap admin ready");
            }
        }

        Ok(Self { config, state })
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        // Create router
        let app = create_router(self.state, &self.config.server);

        // Create listener
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Inspection daemon listening on {}", addr);
        tracing::info!(evidence_root = %self.config.evidence.root_dir.display(), "Evidence store ready");

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Inspection daemon shutting down");

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
