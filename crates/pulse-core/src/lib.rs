//! pulse-core: Query orchestration for time-series dashboard panels
//!
//! Panels run their queries against a data source, keep the newest result
//! and refetch on a shared refresh clock. Transport and decoding sit behind
//! traits so hosts can plug in their own.
//!
//! # Main Entry Points
//!
//! - [`panel`] - Per-panel orchestrator, session state and render decision
//! - [`clock`] - Shared refresh clock and its driver
//! - [`fetch`] - Query executor and response decoder boundaries
//! - [`config`] - Configuration management
//! - [`report`] - Error reporting sinks

pub mod clock;
pub mod config;
pub mod errors;
pub mod events;
pub mod fetch;
pub mod logging;
pub mod panel;
pub mod query;
pub mod report;

// Re-export commonly used types at crate root for convenience
pub use clock::{ClockDriver, ClockError, RefreshClock, SubscriptionId, TickSummary};
pub use config::PulseConfig;
pub use errors::{PulseError, PulseResult};
pub use fetch::{DecodeError, FetchError, QueryExecutor, ResponseDecoder};
pub use panel::{
    FetchDispatch, FetchOutcome, LoadingPhase, PanelError, PanelProps, PanelRender, PanelSession,
    PanelView, PendingFetch, QueryOrchestrator,
};
pub use query::{Query, QueryResult, RawResponse, Table};
pub use report::{ErrorReport, ErrorReporter, InMemoryReporter, NullReporter, TracingReporter};

// Re-export logging initialization
pub use logging::init_logging;
