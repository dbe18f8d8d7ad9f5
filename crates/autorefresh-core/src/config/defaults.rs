//! Default values for configuration types.
//!
//! Every configurable field is optional in the file format; accessors on the
//! config types fall back to the constants here.

use std::time::Duration;

use crate::config::types::{PollConfig, TriggerConfig, WatchdogConfig};
use crate::host::Selector;

/// Delay between readiness checks while the target region is absent.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Interval between activations of the refresh control.
pub const DEFAULT_CADENCE_MS: u64 = 5000;

/// Delay between the document-loaded signal and the first readiness check.
pub const DEFAULT_DOCUMENT_LOADED_DELAY_MS: u64 = 2000;

/// Region whose presence means the tracker tab is mounted.
pub const DEFAULT_TARGET_REGION: &str = "#tab_job_tracker";

/// Control activated on each tick.
pub const DEFAULT_CONTROL: &str = "#tracker_table_refresh_btn";

impl PollConfig {
    pub fn target_region(&self) -> Selector {
        self.target_region
            .clone()
            .unwrap_or_else(|| Selector::from_static(DEFAULT_TARGET_REGION))
    }

    pub fn retry_delay_ms(&self) -> u64 {
        self.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms())
    }

    pub fn document_loaded_delay_ms(&self) -> u64 {
        self.document_loaded_delay_ms
            .unwrap_or(DEFAULT_DOCUMENT_LOADED_DELAY_MS)
    }

    pub fn document_loaded_delay(&self) -> Duration {
        Duration::from_millis(self.document_loaded_delay_ms())
    }
}

impl TriggerConfig {
    pub fn control(&self) -> Selector {
        self.control
            .clone()
            .unwrap_or_else(|| Selector::from_static(DEFAULT_CONTROL))
    }

    pub fn cadence_ms(&self) -> u64 {
        self.cadence_ms.unwrap_or(DEFAULT_CADENCE_MS)
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms())
    }
}

impl WatchdogConfig {
    /// Copy of this config with every default filled in.
    ///
    /// Used when showing the effective configuration.
    pub fn resolved(&self) -> WatchdogConfig {
        WatchdogConfig {
            poll: PollConfig {
                target_region: Some(self.poll.target_region()),
                retry_delay_ms: Some(self.poll.retry_delay_ms()),
                document_loaded_delay_ms: Some(self.poll.document_loaded_delay_ms()),
            },
            trigger: TriggerConfig {
                control: Some(self.trigger.control()),
                cadence_ms: Some(self.trigger.cadence_ms()),
            },
        }
    }
}
