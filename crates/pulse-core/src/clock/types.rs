use std::sync::Arc;

/// Callback invoked on every tick. Takes no arguments; anything slow must be
/// spawned by the callback itself since the clock never awaits it.
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`RefreshClock::subscribe`](super::RefreshClock::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// What happened during one tick dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Subscribers whose callback returned normally.
    pub delivered: usize,
    /// Subscribers whose callback panicked.
    pub panicked: usize,
    /// Subscribers removed by an earlier callback in the same tick.
    pub skipped: usize,
}
