use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with optional quiet mode.
///
/// When `quiet` is true, only error-level events are emitted.
/// When `quiet` is false, info-level and above events are emitted (default).
///
/// Only the first call installs the subscriber; later calls are ignored.
pub fn init_logging(quiet: bool) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(EnvFilter::from_default_env().add_directive(log_directive(quiet)))
        .try_init();
}

fn log_directive(quiet: bool) -> Directive {
    let (directive, fallback) = if quiet {
        ("pulse_core=error", tracing::Level::ERROR)
    } else {
        ("pulse_core=info", tracing::Level::INFO)
    };
    directive.parse().unwrap_or_else(|_| fallback.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directive_targets_crate() {
        assert_eq!(log_directive(true).to_string(), "pulse_core=error");
        assert_eq!(log_directive(false).to_string(), "pulse_core=info");
    }

    #[test]
    fn test_init_logging_twice_does_not_panic() {
        init_logging(true);
        init_logging(false);
    }
}
