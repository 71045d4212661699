use crate::errors::PulseError;
use crate::fetch::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("Panel '{panel}' is already active")]
    AlreadyActive { panel: String },

    #[error("Panel '{panel}' is not active")]
    NotActive { panel: String },

    #[error("Panel orchestrator requires a tokio runtime")]
    NoRuntime,

    #[error("Panel '{panel}' could not decode fetch {generation}: {source}")]
    DecodeFault {
        panel: String,
        generation: u64,
        #[source]
        source: DecodeError,
    },

    #[error("Fetch task for panel '{panel}' did not complete: {message}")]
    TaskFailed { panel: String, message: String },

    #[error("Component '{component}' panicked: {message}")]
    Panicked { component: String, message: String },
}

impl PulseError for PanelError {
    fn error_code(&self) -> &'static str {
        match self {
            PanelError::AlreadyActive { .. } => "PANEL_ALREADY_ACTIVE",
            PanelError::NotActive { .. } => "PANEL_NOT_ACTIVE",
            PanelError::NoRuntime => "PANEL_NO_RUNTIME",
            PanelError::DecodeFault { .. } => "PANEL_DECODE_FAULT",
            PanelError::TaskFailed { .. } => "PANEL_TASK_FAILED",
            PanelError::Panicked { .. } => "PANEL_PANICKED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            PanelError::AlreadyActive { .. } | PanelError::NotActive { .. }
        )
    }
}
