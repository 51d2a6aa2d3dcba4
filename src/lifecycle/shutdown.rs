//! Graceful shutdown for the file server.
//!
//! `main` owns one [`Shutdown`]; the server holds a receiver and hands
//! [`stop_accepting`] to `axum::serve`. Once triggered the listener is
//! closed, connections already accepted keep going, and any response body
//! still streaming a file runs to completion (so its "request complete"
//! line is still written) before `HttpServer::run` returns.

use tokio::sync::broadcast;

/// Sender side of the shutdown notice.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for a server about to start serving.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Tell every subscribed server to stop accepting and drain.
    ///
    /// Returns how many servers were listening.
    pub fn trigger(&self) -> usize {
        let servers = self.tx.send(()).unwrap_or(0);
        tracing::info!(servers, "Shutdown triggered, draining in-flight requests");
        servers
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves when the server should stop accepting connections.
///
/// A dropped [`Shutdown`] counts as a trigger, so a server never outlives
/// its owner.
pub async fn stop_accepting(mut rx: broadcast::Receiver<()>) {
    if rx.recv().await.is_err() {
        tracing::debug!("Shutdown owner dropped, stopping listener");
    }
}
