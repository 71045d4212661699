use crate::errors::PulseError;

#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("Refresh clock driver is already running")]
    DriverAlreadyRunning,

    #[error("Refresh clock driver requires a tokio runtime")]
    NoRuntime,
}

impl PulseError for ClockError {
    fn error_code(&self) -> &'static str {
        match self {
            ClockError::DriverAlreadyRunning => "CLOCK_DRIVER_ALREADY_RUNNING",
            ClockError::NoRuntime => "CLOCK_NO_RUNTIME",
        }
    }
}
