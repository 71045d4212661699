//! Shared auto-refresh clock.
//!
//! A single [`RefreshClock`] is constructed at startup and injected into
//! every panel orchestrator. [`RefreshClock::start`] spawns the wall-clock
//! driver; tests usually call [`RefreshClock::tick`] directly.

pub mod driver;
pub mod errors;
pub mod refresh;
pub mod types;

pub use driver::ClockDriver;
pub use errors::ClockError;
pub use refresh::RefreshClock;
pub use types::{SubscriptionId, TickCallback, TickSummary};
