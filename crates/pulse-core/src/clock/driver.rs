use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::errors::ClockError;
use super::refresh::RefreshClock;

/// Background task that fires [`RefreshClock::tick`] on the clock's interval.
///
/// Dropping the driver stops it; [`ClockDriver::shutdown`] also waits for
/// the task to exit.
pub struct ClockDriver {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ClockDriver {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop ticking and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Err(e) = (&mut self.handle).await {
            warn!(event = "core.clock.driver_join_failed", error = %e);
        }
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl RefreshClock {
    /// Spawn the tick loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// `NoRuntime` outside a tokio runtime, `DriverAlreadyRunning` if a
    /// driver for this clock has not stopped yet.
    pub fn start(self: &Arc<Self>) -> Result<ClockDriver, ClockError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ClockError::NoRuntime)?;

        if self.driver_running.swap(true, Ordering::SeqCst) {
            return Err(ClockError::DriverAlreadyRunning);
        }

        let token = CancellationToken::new();
        let handle = runtime.spawn(run_driver(self.clone(), token.clone()));

        Ok(ClockDriver { token, handle })
    }
}

async fn run_driver(clock: Arc<RefreshClock>, token: CancellationToken) {
    let mut interval_rx = clock.watch_interval();

    info!(
        event = "core.clock.driver_started",
        interval_ms = clock.interval().as_millis() as u64,
    );

    loop {
        let period = *interval_rx.borrow_and_update();

        if period.is_zero() {
            info!(event = "core.clock.driver_paused");
            tokio::select! {
                _ = token.cancelled() => break,
                changed = interval_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(period) => {
                clock.tick();
            }
        }
    }

    clock.driver_running.store(false, Ordering::SeqCst);
    info!(event = "core.clock.driver_stopped", ticks = clock.tick_count());
}
