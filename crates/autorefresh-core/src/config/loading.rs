//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.autorefresh/config.toml`
//! 3. **Project config** - `./.autorefresh/config.toml`
//! 4. **CLI arguments** - Command-line flags (highest priority)

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::types::{PollConfig, TriggerConfig, WatchdogConfig};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;

const CONFIG_DIR: &str = ".autorefresh";
const CONFIG_FILE: &str = "config.toml";

/// Path of the user config file, `~/.autorefresh/config.toml`.
pub fn user_config_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
    Ok(home_dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Path of the project config file under `dir`.
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load configuration from the hierarchy of config files.
///
/// # Errors
///
/// Returns an error if a file exists but cannot be read or parsed, or if
/// validation fails. Missing config files are not errors.
pub fn load_hierarchy() -> Result<WatchdogConfig, ConfigError> {
    // No home directory just means no user layer
    let user_path = user_config_path().ok();
    let project_dir = std::env::current_dir().map_err(|source| ConfigError::ReadFailed {
        path: ".".to_string(),
        source,
    })?;
    load_hierarchy_from(user_path.as_deref(), &project_config_path(&project_dir))
}

/// Load and merge the given user and project files over the defaults.
pub fn load_hierarchy_from(
    user_path: Option<&Path>,
    project_path: &Path,
) -> Result<WatchdogConfig, ConfigError> {
    let mut config = WatchdogConfig::default();

    let layers = user_path.into_iter().chain(std::iter::once(project_path));
    for path in layers {
        match load_config_file(path) {
            Ok(layer) => {
                debug!(
                    event = "core.config.layer_loaded",
                    path = %path.display()
                );
                config = merge_configs(config, layer);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
    }

    validate_config(&config)?;

    Ok(config)
}

/// Load a configuration file from the given path.
pub fn load_config_file(path: &Path) -> Result<WatchdogConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Merge two configurations, with override_config taking precedence.
///
/// A field set in the override replaces the base value; unset fields keep it.
pub fn merge_configs(base: WatchdogConfig, override_config: WatchdogConfig) -> WatchdogConfig {
    WatchdogConfig {
        poll: PollConfig {
            target_region: override_config
                .poll
                .target_region
                .or(base.poll.target_region),
            retry_delay_ms: override_config
                .poll
                .retry_delay_ms
                .or(base.poll.retry_delay_ms),
            document_loaded_delay_ms: override_config
                .poll
                .document_loaded_delay_ms
                .or(base.poll.document_loaded_delay_ms),
        },
        trigger: TriggerConfig {
            control: override_config.trigger.control.or(base.trigger.control),
            cadence_ms: override_config
                .trigger
                .cadence_ms
                .or(base.trigger.cadence_ms),
        },
    }
}
