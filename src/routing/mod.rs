//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → mux.rs (axum route table)
//!     → matched route        → handler
//!     → static route          → static_files.rs
//!         file exists         → ServeDir (prefix stripped)
//!         file missing        → not-found handler
//!     → no route              → not-found handler
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - One not-found handler per router, shared by fallback and static routes
//! - Invalid static patterns are rejected before touching the router

pub mod mux;
pub mod static_files;

pub use mux::{Mux, NotFound, NotFoundService};
pub use static_files::{FileRouteConfig, RouteError};
