//! Error boundary for host-facing panel entry points.

use std::panic::{AssertUnwindSafe, catch_unwind};

use super::errors::PanelError;
use crate::clock::refresh::panic_message;
use crate::report::{ErrorReport, ErrorReporter};

/// Run `f`, reporting any error it returns or any panic it raises.
///
/// Errors are passed through after being reported. A panic is converted
/// into `PanelError::Panicked` so it never unwinds into the host.
pub fn with_error_boundary<T, F>(
    reporter: &dyn ErrorReporter,
    component: &str,
    f: F,
) -> Result<T, PanelError>
where
    F: FnOnce() -> Result<T, PanelError>,
{
    let error = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(error)) => error,
        Err(payload) => PanelError::Panicked {
            component: component.to_string(),
            message: panic_message(payload.as_ref()),
        },
    };

    reporter.report(ErrorReport::from_error(component, &error));
    Err(error)
}
