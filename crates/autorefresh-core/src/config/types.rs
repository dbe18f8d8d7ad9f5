//! Configuration type definitions.
//!
//! These types are serialized/deserialized from TOML config files. Every
//! field is optional so a project file can override a single value without
//! clobbering the user file.
//!
//! # Example Configuration
//!
//! ```toml
//! [poll]
//! target_region = "#tab_job_tracker"
//! retry_delay_ms = 1000
//!
//! [trigger]
//! control = "#tracker_table_refresh_btn"
//! cadence_ms = 5000
//! ```

use serde::{Deserialize, Serialize};

use crate::host::Selector;

/// Main configuration loaded from TOML config files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Readiness polling settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Recurring trigger settings
    #[serde(default)]
    pub trigger: TriggerConfig,
}

/// Readiness polling configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Region whose presence means the UI is ready.
    /// Default: `#tab_job_tracker`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_region: Option<Selector>,

    /// Delay between checks while the region is absent.
    /// Default: 1000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,

    /// Delay after the document-loaded signal before polling starts.
    /// Default: 2000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_loaded_delay_ms: Option<u64>,
}

/// Recurring trigger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Control activated on every tick.
    /// Default: `#tracker_table_refresh_btn`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<Selector>,

    /// Interval between activations.
    /// Default: 5000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence_ms: Option<u64>,
}
