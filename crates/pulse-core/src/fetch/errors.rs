use crate::errors::PulseError;

/// Failure of a single query request at the network boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Query service at '{link}' is unreachable: {message}")]
    Unavailable { link: String, message: String },

    #[error("Query service at '{link}' returned status {status}: {message}")]
    Status {
        link: String,
        status: u16,
        message: String,
    },

    #[error("Query request failed: {message}")]
    Transport { message: String },
}

impl FetchError {
    /// Whether a later tick is likely to succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Unavailable { .. } | FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
        }
    }
}

impl PulseError for FetchError {
    fn error_code(&self) -> &'static str {
        match self {
            FetchError::Unavailable { .. } => "FETCH_UNAVAILABLE",
            FetchError::Status { .. } => "FETCH_STATUS",
            FetchError::Transport { .. } => "FETCH_TRANSPORT",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, FetchError::Status { status, .. } if (400..500).contains(status) && *status != 429)
    }
}

/// A raw response that could not be turned into tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed response: {message}")]
    Malformed { message: String },

    #[error("Unsupported response format: {format}")]
    UnsupportedFormat { format: String },
}

impl PulseError for DecodeError {
    fn error_code(&self) -> &'static str {
        match self {
            DecodeError::Malformed { .. } => "DECODE_MALFORMED",
            DecodeError::UnsupportedFormat { .. } => "DECODE_UNSUPPORTED_FORMAT",
        }
    }
}
