//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → request_logger.rs (RequestInfo → LogFormatter::new_log_entry)
//!     → entry.rs (child span + "request started")
//!     → handler runs inside the request span
//!     → body.rs (count bytes while streaming)
//!     → entry.rs ("request complete" | "request panicked")
//!
//! Consumers:
//!     → logging.rs (fmt / JSON subscriber on stdout)
//! ```
//!
//! # Design Decisions
//! - Request fields live on a span, so any subscriber layer sees them
//! - One terminal line per request, enforced by ownership
//! - The base span is injected, never a global
//! - The only process-wide piece is the panic hook in stack.rs, which
//!   chains to the hook it replaces

pub mod body;
pub mod entry;
pub mod logging;
pub mod request_logger;
mod stack;

pub use entry::{panic_message, LogEntry, LogFormatter, TracingLogEntry, TracingLogger};
pub use request_logger::{request_logger, RequestLogger, RequestLoggerLayer};
