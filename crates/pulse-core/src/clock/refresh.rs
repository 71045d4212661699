use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::types::{SubscriptionId, TickCallback, TickSummary};

/// Shared heartbeat for every panel in the process.
///
/// One instance is created at startup and handed to each
/// [`QueryOrchestrator`](crate::panel::QueryOrchestrator). Subscribers are
/// kept in registration order and invoked in that order on every tick.
/// A tick never waits on its subscribers: callbacks are expected to spawn
/// their own work and return.
pub struct RefreshClock {
    subscribers: Mutex<Vec<(SubscriptionId, TickCallback)>>,
    next_id: AtomicU64,
    ticks: AtomicU64,
    interval: watch::Sender<Duration>,
    pub(super) driver_running: AtomicBool,
}

impl RefreshClock {
    /// Create a clock with the given tick period. A zero period pauses
    /// the driver until the interval is changed.
    pub fn new(interval: Duration) -> Self {
        let (interval, _) = watch::channel(interval);
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            ticks: AtomicU64::new(0),
            interval,
            driver_running: AtomicBool::new(false),
        }
    }

    /// Build a clock from loaded configuration.
    pub fn from_config(config: &crate::config::RefreshConfig) -> Self {
        Self::new(config.interval())
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<(SubscriptionId, TickCallback)>> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a callback to run on every tick until unsubscribed.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let count = {
            let mut subscribers = self.lock_subscribers();
            subscribers.push((id, Arc::new(callback)));
            subscribers.len()
        };

        debug!(
            event = "core.clock.subscribe_completed",
            subscription = %id,
            subscriber_count = count,
        );

        id
    }

    /// Remove a callback. Unknown or already-removed ids are ignored.
    ///
    /// Returns whether a subscriber was actually removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock_subscribers();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        let removed = subscribers.len() != before;
        drop(subscribers);

        if removed {
            debug!(event = "core.clock.unsubscribe_completed", subscription = %id);
        } else {
            debug!(event = "core.clock.unsubscribe_skipped", subscription = %id);
        }

        removed
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.lock_subscribers()
            .iter()
            .any(|(existing, _)| *existing == id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    /// Current tick period.
    pub fn interval(&self) -> Duration {
        *self.interval.borrow()
    }

    /// Change the tick period. The driver picks it up for the next tick it
    /// schedules; a tick already waiting keeps its old deadline and missed
    /// ticks are never replayed.
    pub fn set_interval(&self, interval: Duration) {
        let previous = self.interval.send_replace(interval);
        info!(
            event = "core.clock.interval_changed",
            previous_ms = previous.as_millis() as u64,
            interval_ms = interval.as_millis() as u64,
        );
    }

    pub(super) fn watch_interval(&self) -> watch::Receiver<Duration> {
        self.interval.subscribe()
    }

    /// Number of ticks dispatched so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Fire one tick: invoke every current subscriber in registration order.
    ///
    /// The subscriber list is snapshotted before dispatch so callbacks may
    /// subscribe or unsubscribe (themselves or others) without disturbing
    /// iteration. A subscriber removed earlier in the same tick is skipped;
    /// one added during the tick first runs on the next tick. A panicking
    /// callback is contained and the remaining subscribers still run.
    pub fn tick(&self) -> TickSummary {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot: Vec<(SubscriptionId, TickCallback)> = self.lock_subscribers().clone();

        debug!(
            event = "core.clock.tick_started",
            tick = tick,
            subscriber_count = snapshot.len(),
        );

        let mut summary = TickSummary {
            tick,
            ..TickSummary::default()
        };

        for (id, callback) in snapshot {
            if !self.is_subscribed(id) {
                summary.skipped += 1;
                continue;
            }

            match catch_unwind(AssertUnwindSafe(|| callback())) {
                Ok(()) => summary.delivered += 1,
                Err(payload) => {
                    summary.panicked += 1;
                    warn!(
                        event = "core.clock.subscriber_panicked",
                        tick = tick,
                        subscription = %id,
                        message = %panic_message(payload.as_ref()),
                    );
                }
            }
        }

        debug!(
            event = "core.clock.tick_completed",
            tick = tick,
            delivered = summary.delivered,
            panicked = summary.panicked,
            skipped = summary.skipped,
        );

        summary
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
