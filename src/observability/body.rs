//! Response body wrapper that reports completion to a log entry.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::StatusCode;
use http_body::{Frame, SizeHint};

use crate::observability::entry::LogEntry;

/// Counts body bytes as they are streamed and hands the totals to the entry
/// once the body ends, errors or is dropped.
pub(crate) struct LoggedBody<E: LogEntry> {
    inner: Body,
    entry: Option<E>,
    status: StatusCode,
    bytes: u64,
    start: Instant,
}

// No field is structurally pinned; `Body` boxes its own stream.
impl<E: LogEntry> Unpin for LoggedBody<E> {}

impl<E: LogEntry> LoggedBody<E> {
    pub(crate) fn new(inner: Body, entry: E, status: StatusCode, start: Instant) -> Self {
        Self {
            inner,
            entry: Some(entry),
            status,
            bytes: 0,
            start,
        }
    }

    fn finish(&mut self) {
        if let Some(entry) = self.entry.take() {
            entry.write(self.status, self.bytes, self.start.elapsed());
        }
    }
}

impl<E: LogEntry> http_body::Body for LoggedBody<E> {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);

        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.bytes += data.len() as u64;
                }
            }
            Poll::Ready(Some(Err(_))) | Poll::Ready(None) => this.finish(),
            Poll::Pending => {}
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<E: LogEntry> Drop for LoggedBody<E> {
    fn drop(&mut self) {
        self.finish();
    }
}
