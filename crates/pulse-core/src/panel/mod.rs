//! Panel query orchestration.
//!
//! [`QueryOrchestrator`] drives one panel: it fetches on activation, on
//! relevant prop changes and on every refresh tick, and keeps only the
//! newest result. [`render`] turns the resulting [`PanelSession`] into a
//! presentation decision.

pub mod boundary;
pub mod errors;
pub mod orchestrator;
pub mod render;
pub mod types;

pub use boundary::with_error_boundary;
pub use errors::PanelError;
pub use orchestrator::{FetchDispatch, OrchestratorBuilder, PendingFetch, QueryOrchestrator};
pub use render::{PanelRender, PanelView, render};
pub use types::{FetchOutcome, LoadingPhase, PanelProps, PanelSession, PropsDiff, SkipReason};
