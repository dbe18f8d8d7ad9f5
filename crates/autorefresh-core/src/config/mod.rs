//! # Configuration System
//!
//! Hierarchical TOML configuration for the autorefresh watchdog.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.autorefresh/config.toml`
//! 3. **Project config** - `./.autorefresh/config.toml`
//! 4. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Usage Example
//!
//! ```toml
//! # ~/.autorefresh/config.toml
//! [poll]
//! target_region = "#tab_job_tracker"
//! retry_delay_ms = 1000
//! document_loaded_delay_ms = 2000
//!
//! [trigger]
//! control = "#tracker_table_refresh_btn"
//! cadence_ms = 5000
//! ```
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use autorefresh_core::config::WatchdogConfig;
//!
//! fn example() -> Result<(), autorefresh_core::ConfigError> {
//!     let config = WatchdogConfig::load_hierarchy()?;
//!     println!("cadence: {:?}", config.trigger.cadence());
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

pub use defaults::{
    DEFAULT_CADENCE_MS, DEFAULT_CONTROL, DEFAULT_DOCUMENT_LOADED_DELAY_MS,
    DEFAULT_RETRY_DELAY_MS, DEFAULT_TARGET_REGION,
};
pub use types::{PollConfig, TriggerConfig, WatchdogConfig};
pub use validation::validate_config;

use crate::errors::ConfigError;

impl WatchdogConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }
}
