//! Periodic invocation of a caller-supplied prune callback.
//!
//! The schedule owns no memory data. Each tick awaits the callback once;
//! a tick that comes due while the previous callback is still running is
//! delayed rather than run concurrently. Cancellation is observed between
//! ticks, so stopping never interrupts a callback half-way through a
//! persist.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Outcome of a request to start scheduled pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStart {
    /// A new timer task was spawned.
    Started,
    /// A timer is already running; nothing changed.
    AlreadyRunning,
    /// `enabled` is false in the pruning config.
    Disabled,
    /// Called outside a Tokio runtime.
    NoRuntime,
}

/// Handle to a running timer task.
#[derive(Debug)]
pub(crate) struct ScheduledTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    period: Duration,
}

impl ScheduledTask {
    /// Spawn the timer on the current runtime. The first tick fires one
    /// full `period` after spawning.
    pub(crate) fn spawn<F, Fut, E>(
        runtime: &tokio::runtime::Handle,
        period: Duration,
        callback: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut runs: u64 = 0;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        runs += 1;
                        tracing::debug!(run = runs, "scheduled pruning tick");
                        if let Err(e) = callback().await {
                            tracing::warn!(run = runs, error = %e, "scheduled pruning callback failed");
                        }
                    }
                }
            }

            tracing::debug!(runs, "scheduled pruning task exited");
        });

        Self {
            cancel,
            handle,
            period,
        }
    }

    pub(crate) fn period(&self) -> Duration {
        self.period
    }

    /// Whether the task is still alive (it only exits after cancellation).
    pub(crate) fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
