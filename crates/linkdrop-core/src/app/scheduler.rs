//! Periodic trigger: invokes drain cycles at a fixed cadence and on demand.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::Dispatcher;

/// Scheduler handle.
///
/// - `drain_soon()` schedules a near-immediate cycle (used after enqueue and
///   resume, and for the explicit start-now command).
/// - Shutdown stops taking new cycles; it does not cancel a cycle mid-await.
pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    wake: Arc<Notify>,
    join: JoinHandle<()>,
}

impl Scheduler {
    /// Spawn the trigger loop. The first periodic tick fires immediately, so
    /// a restart with a non-empty persisted queue resumes work right away.
    pub fn spawn(dispatcher: Arc<Dispatcher>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let wake = Arc::new(Notify::new());
        let wake_rx = Arc::clone(&wake);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = wake_rx.notified() => {
                        debug!("immediate drain requested");
                    }
                    changed = shutdown_rx.changed() => {
                        // A dropped handle counts as shutdown.
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }
                if let Err(err) = dispatcher.drain_cycle().await {
                    // Cycle-level failure; the next trigger is the sole
                    // recovery path.
                    warn!(%err, "drain cycle failed");
                }
            }
        });

        Self {
            shutdown_tx,
            wake,
            join,
        }
    }

    /// Request a drain ahead of the periodic tick.
    pub fn drain_soon(&self) {
        self.wake.notify_one();
    }

    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for the trigger loop to finish.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}
