//! Configuration type definitions for pulse.
//!
//! These types are serialized/deserialized from TOML config files.
//!
//! # Example Configuration
//!
//! ```toml
//! [refresh]
//! interval_ms = 10000
//! min_interval_ms = 1000
//!
//! [panel]
//! visible_by_default = true
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration loaded from TOML config files.
///
/// Loaded from, in order:
/// 1. User config: `~/.pulse/config.toml`
/// 2. Project config: `./.pulse/config.toml`
///
/// Project config values override user config values.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PulseConfig {
    /// Shared refresh clock settings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Defaults applied to newly activated panels
    #[serde(default)]
    pub panel: PanelConfig,
}

/// Refresh clock configuration.
///
/// The interval is never persisted back; a process restart always starts
/// from the configured (or built-in) value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Tick period in milliseconds. `0` pauses auto-refresh.
    /// Default: 10000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,

    /// Smallest non-zero interval accepted by validation.
    /// Default: 1000ms.
    #[serde(default = "super::defaults::default_min_interval_ms")]
    pub min_interval_ms: u64,
}

impl RefreshConfig {
    /// Resolved tick period, falling back to the built-in default.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(
            self.interval_ms
                .unwrap_or_else(super::defaults::default_interval_ms),
        )
    }
}

/// Panel defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PanelConfig {
    /// Whether panels start in view when the host does not say otherwise.
    #[serde(default = "super::defaults::default_visible")]
    pub visible_by_default: bool,
}
