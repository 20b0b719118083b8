//! # Interrupt Handling
//!
//! An interrupt ends the run without drawing a winner, but only after the
//! registry has been written to the snapshot file.
//!
//! Two paths lead there:
//!
//! 1. **Cooperative**: the signal cancels a [`CancellationToken`]. The
//!    supervisor observes it at its next checkpoint, calls
//!    [`InterruptController::force_flush`] and returns.
//! 2. **Last resort**: if the supervisor has not finished within the grace
//!    period, or a second signal arrives, the listener flushes by itself and
//!    exits the process.
//!
//! Both paths go through the registry lock, and the flush runs at most once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::registry::UserRegistry;
use crate::store::PersistenceStore;

pub const INTERRUPT_AUDIT: &str = "Program interrupted. Backup saved.";
pub const INTERRUPT_AUDIT_FAILED: &str = "Program interrupted. Backup could not be saved.";

pub struct InterruptController {
    token: CancellationToken,
    registry: Arc<UserRegistry>,
    store: Arc<PersistenceStore>,
    grace: Duration,
    flushed: AtomicBool,
}

impl InterruptController {
    pub fn new(registry: Arc<UserRegistry>, store: Arc<PersistenceStore>, grace: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            registry,
            store,
            grace,
            flushed: AtomicBool::new(false),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Requests a shutdown without waiting for a signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Snapshots the registry and records the interruption.
    ///
    /// Only the first call does any work; later calls return `false`.
    pub fn force_flush(&self) -> bool {
        if self.flushed.swap(true, Ordering::SeqCst) {
            return false;
        }

        let saved = self.store.checkpoint(&self.registry);
        if saved {
            self.store.append(INTERRUPT_AUDIT);
        } else {
            self.store.append(INTERRUPT_AUDIT_FAILED);
        }
        saved
    }

    /// Spawns the signal listener.
    ///
    /// The returned task never completes on its own unless a signal handler
    /// cannot be installed.
    pub fn listen(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("{e:#}");
                return;
            }

            warn!("Program interrupted. Saving progress...");
            this.trigger();

            tokio::select! {
                _ = tokio::time::sleep(this.grace) => {
                    warn!("Shutdown is taking too long, saving from the interrupt handler");
                }
                _ = shutdown_signal() => {
                    warn!("Second interrupt received, saving immediately");
                }
            }

            this.force_flush();
            std::process::exit(0);
        })
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<anyhow::Result<()>>();

    tokio::select! {
        res = ctrl_c => res,
        res = terminate => res,
    }
}
