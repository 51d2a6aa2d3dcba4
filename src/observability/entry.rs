//! Log entries for the request logger.
//!
//! A `LogFormatter` turns a starting request into a `LogEntry`; the entry
//! lives for the rest of the request and is consumed by exactly one of
//! `write` (the response finished) or `panic` (the handler panicked).

use std::any::Any;
use std::backtrace::Backtrace;
use std::time::Duration;

use axum::http::StatusCode;
use tracing::{field, Span};

use crate::http::request::RequestInfo;

/// Builds a log entry for each incoming request.
pub trait LogFormatter: Send + Sync + 'static {
    type Entry: LogEntry;

    fn new_log_entry(&self, info: &RequestInfo) -> Self::Entry;
}

/// Per-request log state.
pub trait LogEntry: Send + 'static {
    /// Span the wrapped handler runs in.
    fn span(&self) -> Span {
        Span::current()
    }

    /// Record the response and emit the completion line.
    fn write(self, status: StatusCode, bytes: u64, elapsed: Duration);

    /// Record a handler panic and emit the panic line. The request is
    /// answered with an empty `500`.
    fn panic(self, value: &(dyn Any + Send), stack: &Backtrace, elapsed: Duration);
}

/// `LogFormatter` backed by `tracing` spans.
///
/// Every request gets a child span of `base` carrying the request fields;
/// the base span is never touched.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    base: Span,
}

impl TracingLogger {
    pub fn new(base: Span) -> Self {
        Self { base }
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(Span::none())
    }
}

impl LogFormatter for TracingLogger {
    type Entry = TracingLogEntry;

    fn new_log_entry(&self, info: &RequestInfo) -> TracingLogEntry {
        let span = tracing::info_span!(
            parent: &self.base,
            "request",
            request_id = field::Empty,
            http_proto = %info.proto,
            http_scheme = info.scheme,
            http_method = %info.method,
            remote_addr = field::Empty,
            user_agent = %info.user_agent,
            uri = %info.uri(),
            resp_status = field::Empty,
            resp_bytes_length = field::Empty,
            resp_elapsed = field::Empty,
            stack = field::Empty,
            panic = field::Empty,
        );

        if let Some(request_id) = &info.request_id {
            span.record("request_id", request_id.as_str());
        }
        if let Some(addr) = info.remote_addr {
            span.record("remote_addr", field::display(addr));
        }

        tracing::info!(parent: &span, "request started");

        TracingLogEntry { span }
    }
}

/// A request span that accumulates response or panic fields.
#[derive(Debug)]
pub struct TracingLogEntry {
    span: Span,
}

impl LogEntry for TracingLogEntry {
    fn span(&self) -> Span {
        self.span.clone()
    }

    fn write(self, status: StatusCode, bytes: u64, elapsed: Duration) {
        self.span.record("resp_status", status.as_u16());
        self.span.record("resp_bytes_length", bytes);
        self.span.record("resp_elapsed", field::debug(elapsed));

        tracing::info!(parent: &self.span, "request complete");
    }

    fn panic(self, value: &(dyn Any + Send), stack: &Backtrace, elapsed: Duration) {
        self.span.record("resp_status", StatusCode::INTERNAL_SERVER_ERROR.as_u16());
        self.span.record("resp_bytes_length", 0_u64);
        self.span.record("resp_elapsed", field::debug(elapsed));
        self.span.record("stack", field::display(stack));
        self.span.record("panic", panic_message(value).as_str());

        tracing::error!(parent: &self.span, "request panicked");
    }
}

/// Render a panic payload for logging.
pub fn panic_message(value: &(dyn Any + Send)) -> String {
    if let Some(s) = value.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = value.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}
