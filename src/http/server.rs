//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Bind the TCP listener up front (fail fast)
//! - Let the host register routes
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve in the background
//! - Stop accepting and drain in-flight requests within a deadline

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::{ManagedService, ServiceError, ShutdownContext};

/// Error type for server construction.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid bind address '{address}': {source}")]
    InvalidAddress {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },
}

/// HTTP server wrapped as a [`ManagedService`].
pub struct HttpServer {
    config: ServerConfig,
    routes: Router,
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    stop: CancellationToken,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl HttpServer {
    /// Bind to the configured address. Nothing is served until
    /// [`run_async`](ManagedService::run_async).
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let addr: SocketAddr =
            config
                .bind_address
                .parse()
                .map_err(|source| ServerError::InvalidAddress {
                    address: config.bind_address.clone(),
                    source,
                })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            address: addr,
            source,
        })?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self {
            config: config.clone(),
            routes: Router::new(),
            listener: Some(listener),
            local_addr,
            stop: CancellationToken::new(),
            task: None,
        })
    }

    /// Register routes. May be called several times before starting.
    pub fn setup<F>(&mut self, register: F)
    where
        F: FnOnce(Router) -> Router,
    {
        let routes = std::mem::take(&mut self.routes);
        self.routes = register(routes);
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether the serve task has been started and not yet shut down.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Wrap the registered routes with the middleware stack.
    #[allow(deprecated)]
    fn build_app(routes: Router, config: &ServerConfig) -> Router {
        // Outermost first: the id must exist before the trace span opens.
        routes.layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.request_timeout_secs,
                ))),
        )
    }
}

impl ManagedService for HttpServer {
    fn name(&self) -> &str {
        "http"
    }

    fn run_async(&mut self) {
        let Some(listener) = self.listener.take() else {
            tracing::warn!(address = %self.local_addr, "HTTP server already started");
            return;
        };

        let app = Self::build_app(std::mem::take(&mut self.routes), &self.config);
        let stop = self.stop.clone();
        let addr = self.local_addr;

        tracing::info!(address = %addr, "HTTP server starting");

        self.task = Some(tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await;

            match &result {
                Ok(()) => tracing::info!(address = %addr, "HTTP server stopped"),
                Err(e) => tracing::error!(address = %addr, error = %e, "HTTP server failed"),
            }
            result
        }));
    }

    async fn shutdown(&mut self, ctx: &ShutdownContext) -> Result<(), ServiceError> {
        let Some(mut task) = self.task.take() else {
            return Err(ServiceError::NotRunning);
        };

        tracing::info!(
            address = %self.local_addr,
            remaining_ms = ctx.remaining().as_millis() as u64,
            "Stopping HTTP server, draining connections"
        );
        self.stop.cancel();

        tokio::select! {
            biased;
            joined = &mut task => match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(ServiceError::Serve(e)),
                Err(e) => Err(ServiceError::Join(e.to_string())),
            },
            _ = ctx.expired() => {
                task.abort();
                tracing::warn!(
                    address = %self.local_addr,
                    grace_ms = ctx.grace().as_millis() as u64,
                    "Drain deadline passed, abandoning in-flight requests"
                );
                Err(ServiceError::DeadlineExceeded {
                    grace_ms: ctx.grace().as_millis() as u64,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> ServerConfig {
        ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            request_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn bind_reports_ephemeral_port() {
        let server = HttpServer::bind(&local_config()).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn bind_rejects_bad_address() {
        let config = ServerConfig {
            bind_address: "not-an-address".to_string(),
            request_timeout_secs: 5,
        };
        let err = HttpServer::bind(&config).await.err().unwrap();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn shutdown_before_start_is_not_running() {
        let mut server = HttpServer::bind(&local_config()).await.unwrap();
        let ctx = ShutdownContext::new(Duration::from_millis(100));
        assert!(matches!(
            server.shutdown(&ctx).await,
            Err(ServiceError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn start_then_stop() {
        let mut server = HttpServer::bind(&local_config()).await.unwrap();
        server.run_async();
        assert!(server.is_running());

        // Second start is ignored.
        server.run_async();

        let ctx = ShutdownContext::new(Duration::from_millis(500));
        server.shutdown(&ctx).await.unwrap();
        assert!(!server.is_running());

        assert!(matches!(
            server.shutdown(&ctx).await,
            Err(ServiceError::NotRunning)
        ));
    }
}
