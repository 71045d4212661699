//! Configuration validation.

use crate::config::types::PulseConfig;
use crate::errors::ConfigError;

/// Validate the merged configuration.
///
/// # Errors
///
/// Returns `InvalidRefreshInterval` when a non-zero interval is below the
/// configured floor, and `InvalidConfiguration` when the floor itself is zero.
pub fn validate_config(config: &PulseConfig) -> Result<(), ConfigError> {
    let refresh = &config.refresh;

    if refresh.min_interval_ms == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "refresh.min_interval_ms must be greater than 0".to_string(),
        });
    }

    if let Some(interval_ms) = refresh.interval_ms
        && interval_ms != 0
        && interval_ms < refresh.min_interval_ms
    {
        return Err(ConfigError::InvalidRefreshInterval {
            interval_ms,
            min_ms: refresh.min_interval_ms,
        });
    }

    Ok(())
}
