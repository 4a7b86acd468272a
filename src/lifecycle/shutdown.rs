//! Shutdown coordination for the gateway.
//!
//! One `Shutdown` is created at boot and handed to whatever may stop the
//! process (the signal listener, tests). The server holds a receiver and
//! starts draining once a trigger arrives.

use tokio::sync::broadcast::{self, error::RecvError};

/// Coordinator for graceful shutdown.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to pass to [`triggered`].
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscriber to stop. `reason` is logged.
    pub fn trigger(&self, reason: &str) {
        match self.tx.send(()) {
            Ok(listeners) => tracing::info!(reason, listeners, "Gateway shutdown requested"),
            Err(_) => tracing::debug!(reason, "Shutdown requested with nothing left to stop"),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once the coordinator behind `rx` is triggered.
///
/// Dropping every `Shutdown` clone without triggering means no stop request
/// can arrive any more, so the future stays pending.
pub async fn triggered(mut rx: broadcast::Receiver<()>) {
    match rx.recv().await {
        Ok(()) | Err(RecvError::Lagged(_)) => {}
        Err(RecvError::Closed) => std::future::pending().await,
    }
}
