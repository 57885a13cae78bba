//! Standalone server startup logic.

use std::io;
use std::net::SocketAddr;

use axum::Router;
use axum_server::Handle;
use tokio::task::JoinHandle;

use crate::check::CheckSet;
use crate::config::{port_from_env, HttpServerConfig, DEFAULT_HOST, PRODUCT_NAME};
use crate::routes::{create_router, with_request_tracing};

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind server to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Server task failed: {0}")]
    Join(String),
}

/// Start the standalone health server with default settings.
///
/// Listens on all interfaces on the port named by the `port` environment
/// variable (3000 when unset). Bind failures are returned, not retried.
pub async fn init(checks: CheckSet) -> Result<ServerHandle, ServerError> {
    ServerBuilder::new(checks).bind().await
}

/// Configures a standalone server before it binds.
///
/// Extra routes must be merged here; once bound the router is fixed.
pub struct ServerBuilder {
    checks: CheckSet,
    host: String,
    port: u16,
    extra: Router,
}

impl ServerBuilder {
    /// Builder with the default host and the port from the environment.
    pub fn new(checks: CheckSet) -> Self {
        Self {
            checks,
            host: DEFAULT_HOST.to_string(),
            port: port_from_env(),
            extra: Router::new(),
        }
    }

    pub fn from_config(checks: CheckSet, config: &HttpServerConfig) -> Self {
        Self::new(checks).host(config.host.clone()).port(config.port)
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Port to listen on; 0 picks an ephemeral port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Attach application routes next to `/health`.
    pub fn merge(mut self, router: Router) -> Self {
        self.extra = self.extra.merge(router);
        self
    }

    /// Bind the listener and start serving in the background.
    pub async fn bind(self) -> Result<ServerHandle, ServerError> {
        let addr = format!("{}:{}", self.host, self.port);
        let bind_error = |source| ServerError::Bind {
            addr: addr.clone(),
            source,
        };

        let listener = tokio::net::TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        let listener = listener.into_std().map_err(bind_error)?;

        let app = with_request_tracing(create_router(self.checks).merge(self.extra));
        let handle = Handle::new();

        tracing::info!(
            %local_addr,
            "{} listening on port {}",
            PRODUCT_NAME,
            local_addr.port()
        );

        let server = axum_server::from_tcp(listener).handle(handle.clone());
        let task = tokio::spawn(async move { server.serve(app.into_make_service()).await });

        Ok(ServerHandle {
            local_addr,
            handle,
            task,
        })
    }
}

/// Owns a running standalone server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    handle: Handle,
    task: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Begin a graceful shutdown. Use [`ServerHandle::wait`] to join it.
    pub fn shutdown(&self) {
        shutdown::graceful_shutdown(&self.handle);
    }

    /// Shut down gracefully when the process receives SIGINT or SIGTERM.
    pub fn shutdown_on_signal(&self) {
        shutdown::setup_shutdown_handler(self.handle.clone());
    }

    /// Wait for the server to stop.
    pub async fn wait(self) -> Result<(), ServerError> {
        match self.task.await {
            Ok(Ok(())) => {
                tracing::debug!(addr = %self.local_addr, "Server stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(ServerError::Server(e.to_string())),
            Err(e) => Err(ServerError::Join(e.to_string())),
        }
    }
}
