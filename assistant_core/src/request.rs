//! Per-request interrupt watching.
//!
//! Each backend request gets a fresh [`CancellationToken`] and its own
//! watcher task. The watcher waits for one interrupt, cancels that token and
//! exits. Dropping the [`InterruptWatcher`] aborts the task, so an interrupt
//! arriving after the request resolved is never charged to it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Source of external interrupt notifications.
#[async_trait]
pub trait Interrupt: Send + Sync {
    /// Resolve when the next interrupt arrives.
    async fn wait(&self);
}

/// Interrupts delivered as Ctrl-C / SIGINT.
#[derive(Debug, Clone, Copy, Default)]
pub struct CtrlC;

#[async_trait]
impl Interrupt for CtrlC {
    async fn wait(&self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C, requests will not be cancellable: {e}");
            std::future::pending::<()>().await;
        }
    }
}

/// Watcher task bound to a single request's token.
pub struct InterruptWatcher {
    handle: JoinHandle<()>,
}

impl InterruptWatcher {
    /// Spawn a watcher that cancels `token` on the next interrupt.
    ///
    /// The task also exits on its own if the token is cancelled elsewhere.
    #[must_use]
    pub fn spawn(interrupt: Arc<dyn Interrupt>, token: CancellationToken) -> Self {
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = interrupt.wait() => {
                    debug!("Interrupt received, cancelling in-flight request");
                    token.cancel();
                }
                () = token.cancelled() => {}
            }
        });
        Self { handle }
    }
}

impl Drop for InterruptWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
