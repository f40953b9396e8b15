//! Shutdown coordination.
//!
//! ```text
//! Running ──trigger()──▶ Draining ──drain()──▶ Terminated
//! ```
//!
//! `trigger` tells the accept loop to stop (it drops the listening socket).
//! `drain` then waits for registered connections, bounded by a deadline,
//! and force-closes whatever is still open when it expires.

use std::time::Duration;

use tokio::sync::watch;

use crate::server::registry::ConnectionRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Running,
    Draining,
    Terminated,
}

/// How the drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every connection finished before the deadline.
    Clean,
    /// The deadline expired; `closed` connections were force-closed.
    Forced { closed: usize },
}

/// Coordinator for graceful shutdown.
///
/// The phase is published on a watch channel so any number of tasks can
/// observe the transition.
pub struct Shutdown {
    tx: watch::Sender<ShutdownPhase>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ShutdownPhase::Running);
        Self { tx }
    }

    pub fn phase(&self) -> ShutdownPhase {
        *self.tx.borrow()
    }

    pub fn is_triggered(&self) -> bool {
        self.phase() != ShutdownPhase::Running
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Moves `Running → Draining`. Returns `false` if shutdown had
    /// already started.
    pub fn trigger(&self) -> bool {
        self.tx.send_if_modified(|phase| {
            if *phase == ShutdownPhase::Running {
                *phase = ShutdownPhase::Draining;
                true
            } else {
                false
            }
        })
    }

    /// Waits for `registry` to empty, up to `deadline`, then moves to
    /// `Terminated`.
    ///
    /// On expiry every remaining connection is force-closed and the call
    /// waits briefly for those tasks to unwind.
    pub async fn drain(&self, registry: &ConnectionRegistry, deadline: Duration) -> DrainOutcome {
        self.trigger();

        let in_flight = registry.active_count();
        tracing::info!(in_flight, deadline = ?deadline, "Draining connections");

        let outcome = match tokio::time::timeout(deadline, registry.wait_idle()).await {
            Ok(()) => {
                tracing::info!("All connections drained");
                DrainOutcome::Clean
            }
            Err(_) => {
                let closed = registry.force_close_all();
                tracing::warn!(closed, "Drain deadline expired, forced close");

                if tokio::time::timeout(FORCE_CLOSE_GRACE, registry.wait_idle())
                    .await
                    .is_err()
                {
                    tracing::error!(
                        remaining = registry.active_count(),
                        "Connections still open after forced close"
                    );
                }
                DrainOutcome::Forced { closed }
            }
        };

        self.tx.send_replace(ShutdownPhase::Terminated);
        outcome
    }
}

/// Grace period for force-closed tasks to drop their sockets.
const FORCE_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Receiver side of [`Shutdown`].
#[derive(Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<ShutdownPhase>,
}

impl ShutdownListener {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow() != ShutdownPhase::Running
    }

    /// Resolves once shutdown has been triggered.
    pub async fn triggered(&mut self) {
        // An error means the coordinator is gone, which also ends serving.
        let _ = self
            .rx
            .wait_for(|phase| *phase != ShutdownPhase::Running)
            .await;
    }
}
