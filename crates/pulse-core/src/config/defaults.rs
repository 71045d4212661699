//! Default implementations for configuration types.
//!
//! This module contains all `Default` implementations and helper functions
//! for providing default values in serde deserialization.

use crate::config::types::{PanelConfig, RefreshConfig};

/// Returns the default refresh interval in milliseconds (10000ms).
pub fn default_interval_ms() -> u64 {
    10_000
}

/// Returns the smallest accepted non-zero refresh interval (1000ms).
///
/// Used by serde `#[serde(default = "...")]` attribute.
pub fn default_min_interval_ms() -> u64 {
    1_000
}

/// Panels are in view unless the host says otherwise.
///
/// Used by serde `#[serde(default = "...")]` attribute.
pub fn default_visible() -> bool {
    true
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: None,
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            visible_by_default: default_visible(),
        }
    }
}
