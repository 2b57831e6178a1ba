//! HTTP transport with Streamable HTTP support for the MCP server.
//!
//! This transport uses HTTP with SSE streaming responses,
//! which is suitable for web-based MCP integrations.

use crate::error::{DbError, DbResult};
use crate::mcp::DbService;
use crate::transport::{Transport, wait_for_signal};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Give open SSE streams this long to finish after a shutdown signal.
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport implementation with Streamable HTTP support.
///
/// Every MCP session gets a clone of the same `DbService`, so all sessions
/// share the one database connection.
pub struct HttpTransport {
    service: DbService,
    host: String,
    port: u16,
    /// MCP endpoint path
    endpoint: String,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Arguments
    ///
    /// * `service` - MCP service handed to every session
    /// * `host` - Host address to bind to
    /// * `port` - Port to bind to
    /// * `endpoint` - MCP endpoint path (e.g., "/mcp")
    pub fn new(
        service: DbService,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            service,
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the MCP endpoint path.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn router(&self) -> axum::Router {
        let service = self.service.clone();
        let mcp = StreamableHttpService::new(
            move || Ok(service.clone()),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // nest_service doesn't support the root path
        if self.endpoint == "/" {
            axum::Router::new().fallback_service(mcp)
        } else {
            axum::Router::new().nest_service(&self.endpoint, mcp)
        }
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> DbResult<()> {
        let bind_addr = self.bind_addr();
        info!("Starting MCP server with HTTP transport on {}", bind_addr);

        let app = self.router();

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            DbError::connection(
                format!("Failed to bind to {}: {}", bind_addr, e),
                "Check that the port is available",
            )
        })?;

        info!(endpoint = %self.endpoint, "MCP endpoint ready");

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();

        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        // SSE streams may keep the server alive, so bound the drain
        let outcome = tokio::select! {
            result = server => {
                match result {
                    Ok(()) => {
                        info!("HTTP server stopped");
                        Ok(())
                    }
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        Err(DbError::internal(format!("HTTP server error: {}", e)))
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => Ok(()),
        };

        info!("Closing database connection");
        self.service.close().await;

        outcome
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
