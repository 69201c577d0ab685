//! Server module for vmxd's HTTP API.
//!
//! This module exposes the VM lifecycle operations over HTTP:
//! - `GET /vms` lists the VMs in the VM directory
//! - `POST /create?name=` creates a VM from the template
//! - `DELETE /delete?name=` deletes a VM's descriptor
//! - `POST /start?name=` and `POST /stop?name=` change a VM's power state

mod data;
mod handlers;
mod routes;
mod state;

use std::net::SocketAddr;

use axum::Router;

use crate::{config::VmxdConfig, management::VmManager, power::PowerController, VmxdResult};

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use data::*;
pub use handlers::*;
pub use routes::*;
pub use state::*;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The vmxd HTTP server
#[derive(Debug, Clone)]
pub struct VmxdServer {
    /// Runs the lifecycle operations behind every route
    manager: VmManager,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl VmxdServer {
    /// Create a new server instance
    pub fn new(config: VmxdConfig, controller: impl PowerController + 'static) -> Self {
        Self {
            manager: VmManager::new(config, controller),
        }
    }

    /// The address the server listens on
    pub fn addr(&self) -> SocketAddr {
        self.manager.config().socket_addr()
    }

    /// Build the router without binding a socket
    pub fn router(&self) -> VmxdResult<Router> {
        create_router(ServerState::new(self.manager.clone()))
    }

    /// Start the server and run until Ctrl-C or SIGTERM
    pub async fn serve(&self) -> VmxdResult<()> {
        let app = self.router()?;
        let addr = self.addr();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!(
            "serving vms from {} on {}",
            self.manager.config().get_vm_dir().display(),
            addr
        );

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("server stopped");

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
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
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
