//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.pulse/config.toml` (global user preferences)
//! 3. **Project config** - `./.pulse/config.toml` (project-specific overrides)

use crate::config::types::{PanelConfig, PulseConfig, RefreshConfig};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_DIR: &str = ".pulse";
const CONFIG_FILE: &str = "config.toml";

/// Load configuration from the hierarchy of config files.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed,
/// or if validation fails. Missing config files are not errors.
pub fn load_hierarchy() -> Result<PulseConfig, ConfigError> {
    let user_path = dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE));
    let project_path = std::env::current_dir()?.join(CONFIG_DIR).join(CONFIG_FILE);
    load_hierarchy_from(user_path.as_deref(), &project_path)
}

/// Load and merge the given user and project config files.
///
/// Split out from [`load_hierarchy`] so callers and tests can point at
/// arbitrary locations.
pub fn load_hierarchy_from(
    user_path: Option<&Path>,
    project_path: &Path,
) -> Result<PulseConfig, ConfigError> {
    info!(event = "core.config.load_started");

    let mut config = PulseConfig::default();

    for path in user_path.into_iter().chain(std::iter::once(project_path)) {
        match load_config_file(path) {
            Ok(layer) => {
                debug!(event = "core.config.layer_loaded", path = %path.display());
                config = merge_configs(config, layer);
            }
            Err(ConfigError::ConfigNotFound { .. }) => {
                debug!(event = "core.config.layer_skipped", path = %path.display());
            }
            Err(e) => return Err(e),
        }
    }

    validate_config(&config)?;

    info!(
        event = "core.config.load_completed",
        interval_ms = config.refresh.interval().as_millis() as u64,
    );

    Ok(config)
}

/// Load a configuration file from the given path.
pub fn load_config_file(path: &Path) -> Result<PulseConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Path of the project-level config file under `root`.
pub fn project_config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Merge two configurations, with override_config taking precedence.
///
/// Optional fields are replaced only when the override sets them.
pub fn merge_configs(base: PulseConfig, override_config: PulseConfig) -> PulseConfig {
    PulseConfig {
        refresh: RefreshConfig {
            interval_ms: override_config
                .refresh
                .interval_ms
                .or(base.refresh.interval_ms),
            min_interval_ms: override_config.refresh.min_interval_ms,
        },
        panel: PanelConfig {
            visible_by_default: override_config.panel.visible_by_default,
        },
    }
}
