//! Error reporting for faults that must reach the host.
//!
//! Activation-time faults and decode failures are handed to an
//! [`ErrorReporter`]. Implementations can log them, forward them to the
//! host UI, or collect them for assertions.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::error;

use crate::errors::PulseError;

/// One reported fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub timestamp: DateTime<Utc>,
    /// Which component raised it, e.g. `panel:cpu-usage`.
    pub component: String,
    pub error_code: String,
    pub message: String,
}

impl ErrorReport {
    pub fn new(
        component: impl Into<String>,
        error_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            component: component.into(),
            error_code: error_code.into(),
            message: message.into(),
        }
    }

    pub fn from_error(component: impl Into<String>, error: &dyn PulseError) -> Self {
        Self::new(component, error.error_code(), error.to_string())
    }
}

/// Sink for faults surfaced to the host.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: ErrorReport);
}

/// Reporter that emits each fault as a structured `tracing` error event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, report: ErrorReport) {
        error!(
            event = "core.report.fault_reported",
            component = %report.component,
            error_code = %report.error_code,
            error = %report.message,
        );
    }
}

/// In-memory reporter for testing.
#[derive(Default)]
pub struct InMemoryReporter {
    reports: Mutex<Vec<ErrorReport>>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ErrorReport>> {
        match self.reports.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        self.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }
}

impl ErrorReporter for InMemoryReporter {
    fn report(&self, report: ErrorReport) {
        self.lock().push(report);
    }
}

/// Reporter that discards everything.
pub struct NullReporter;

impl ErrorReporter for NullReporter {
    fn report(&self, _report: ErrorReport) {}
}
