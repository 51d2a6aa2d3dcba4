//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve, ConnectInfo)
//!     → SetRequestId / PropagateRequestId (tower-http)
//!     → request logger (observability)
//!     → request.rs (RequestInfo for the log entry)
//!     → routing (static mounts, not-found)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{RequestInfo, TlsTerminated};
pub use server::{HttpServer, ServerError, NOT_FOUND_BODY};
