//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the router from configuration (static mounts, not-found page)
//! - Wire up middleware (request ID, request logging)
//! - Serve on a listener until shutdown is signalled

use std::net::SocketAddr;

use axum::{http::StatusCode, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

use crate::config::ServerConfig;
use crate::lifecycle::shutdown;
use crate::observability::request_logger;
use crate::routing::{FileRouteConfig, Mux, RouteError};

/// Body of the server's not-found page.
pub const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Error type for server construction and serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid route: {0}")]
    Route(#[from] RouteError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP server serving the configured static mounts.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let router = Self::build_router(&config)?;
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig) -> Result<Router, ServerError> {
        let mut mux = Mux::<()>::new().not_found(|| async { (StatusCode::NOT_FOUND, NOT_FOUND_BODY) });

        for mount in &config.mounts {
            let route = FileRouteConfig::new(mount.pattern.clone(), mount.root.clone())?;
            tracing::info!(
                pattern = %route.pattern(),
                root = %route.root().display(),
                "Static route mounted"
            );
            mux = route.mount(mux)?;
        }

        let router = mux.into_router().layer(request_logger(Span::none()));

        // Outermost last: the ID must exist before the logger reads it.
        let router = if config.observability.request_id {
            router
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        } else {
            router
        };

        Ok(router)
    }

    /// The router this server answers with.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mounts = self.config.mounts.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::stop_accepting(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
