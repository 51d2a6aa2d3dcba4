//! Static file routes and structured request logging for axum.
//!
//! - [`routing::FileRouteConfig`] mounts a directory under a URL prefix,
//!   redirecting the bare prefix and sending misses to the router's
//!   not-found handler.
//! - [`observability::request_logger`] wraps a service so every request gets
//!   a span with its context, a start line and exactly one completion (or
//!   panic) line.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use http::{HttpServer, RequestInfo, TlsTerminated};
pub use lifecycle::Shutdown;
pub use observability::{request_logger, LogEntry, LogFormatter, RequestLoggerLayer, TracingLogger};
pub use routing::{FileRouteConfig, Mux, RouteError};
