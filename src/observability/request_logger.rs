//! Request logging middleware.
//!
//! # Responsibilities
//! - Build a log entry for every request before the handler runs
//! - Run the handler inside the entry's span
//! - Report status, streamed bytes and elapsed time when the body ends
//! - Catch handler panics, record them on the entry and answer `500`
//!
//! # Design Decisions
//! - Entries are consumed by `write`/`panic`, so a request can only ever
//!   produce one terminal line
//! - Completion is tied to the response body, not the handler future; the
//!   byte count is what the client was actually sent
//! - Panic payloads are only rendered to text, never resumed
//! - The panic stack is captured by a panic hook at the panic site; the
//!   frames are already gone once `catch_unwind` returns

use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tower::{Layer, Service};
use tracing::{Instrument, Span};

use crate::http::request::RequestInfo;
use crate::observability::body::LoggedBody;
use crate::observability::entry::{LogEntry, LogFormatter, TracingLogger};
use crate::observability::stack::{self, CaptureStack};

/// Request logger backed by `tracing`, with request spans parented to `base`.
pub fn request_logger(base: Span) -> RequestLoggerLayer<TracingLogger> {
    RequestLoggerLayer::new(TracingLogger::new(base))
}

/// Layer that applies [`RequestLogger`].
#[derive(Debug)]
pub struct RequestLoggerLayer<F> {
    formatter: Arc<F>,
}

impl<F: LogFormatter> RequestLoggerLayer<F> {
    /// Wrap `formatter`, installing the panic-site stack hook on first use.
    pub fn new(formatter: F) -> Self {
        stack::install_hook();
        Self {
            formatter: Arc::new(formatter),
        }
    }
}

impl<F> Clone for RequestLoggerLayer<F> {
    fn clone(&self) -> Self {
        Self {
            formatter: Arc::clone(&self.formatter),
        }
    }
}

impl<S, F> Layer<S> for RequestLoggerLayer<F> {
    type Service = RequestLogger<S, F>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogger {
            inner,
            formatter: Arc::clone(&self.formatter),
        }
    }
}

/// Middleware that logs the start and end of every request.
#[derive(Debug)]
pub struct RequestLogger<S, F> {
    inner: S,
    formatter: Arc<F>,
}

impl<S: Clone, F> Clone for RequestLogger<S, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            formatter: Arc::clone(&self.formatter),
        }
    }
}

impl<S, F> Service<Request<Body>> for RequestLogger<S, F>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    F: LogFormatter,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // The readied service goes into the future; a fresh clone stays behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let start = Instant::now();
        let info = RequestInfo::from_request(&req);
        let entry = self.formatter.new_log_entry(&info);
        let span = entry.span();

        Box::pin(async move {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| {
                span.in_scope(|| stack::capturing(|| inner.call(req)))
            })) {
                Ok(future) => {
                    AssertUnwindSafe(CaptureStack::new(future))
                        .catch_unwind()
                        .instrument(span)
                        .await
                }
                Err(payload) => Err(payload),
            };

            match outcome {
                Ok(Ok(response)) => {
                    let (parts, body) = response.into_parts();
                    let body = LoggedBody::new(body, entry, parts.status, start);
                    Ok(Response::from_parts(parts, Body::new(body)))
                }
                Ok(Err(err)) => {
                    entry.write(StatusCode::INTERNAL_SERVER_ERROR, 0, start.elapsed());
                    Err(err)
                }
                Err(payload) => {
                    let backtrace = stack::take().unwrap_or_else(Backtrace::force_capture);
                    entry.panic(payload.as_ref(), &backtrace, start.elapsed());
                    Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
                }
            }
        })
    }
}
