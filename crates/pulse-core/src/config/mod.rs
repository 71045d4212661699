//! # Configuration System
//!
//! Hierarchical TOML configuration for pulse.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.pulse/config.toml` (global user preferences)
//! 3. **Project config** - `./.pulse/config.toml` (project-specific overrides)
//!
//! The refresh interval read here only seeds the [`RefreshClock`]; changing
//! it at runtime through [`RefreshClock::set_interval`] is never written back.
//!
//! ## Usage Example
//!
//! ```toml
//! # ~/.pulse/config.toml
//! [refresh]
//! interval_ms = 30000
//! ```
//!
//! ```rust,no_run
//! use pulse_core::config::PulseConfig;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PulseConfig::load_hierarchy()?;
//!     let period = config.refresh.interval();
//!     Ok(())
//! }
//! ```
//!
//! [`RefreshClock`]: crate::clock::RefreshClock
//! [`RefreshClock::set_interval`]: crate::clock::RefreshClock::set_interval

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

// Public API exports
pub use types::{PanelConfig, PulseConfig, RefreshConfig};
pub use validation::validate_config;

impl PulseConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}
