//! autorefresh-core: readiness-gated periodic UI refresh
//!
//! Keeps a refresh control inside a host UI firing on a fixed cadence, even
//! though the host builds its UI tree asynchronously and the target region
//! may not exist yet when the watchdog is installed.
//!
//! # Main Entry Points
//!
//! - [`watchdog`] - Install the watchdog against a host and wire entry signals
//! - [`poller`] - Poll until the target region is mounted
//! - [`trigger`] - Single-cadence recurring activation of the control
//! - [`host`] - Host capability interface and the in-memory simulated host
//! - [`config`] - Configuration management

pub mod config;
pub mod errors;
pub mod events;
pub mod host;
pub mod logging;
pub mod poller;
pub mod trigger;
pub mod watchdog;

// Re-export commonly used types at crate root for convenience
pub use config::WatchdogConfig;
pub use errors::{AutorefreshError, ConfigError};
pub use host::{HostError, NodeRef, Selector, SimulatedHost, UiHost};
pub use poller::{PollState, ReadinessPoller};
pub use trigger::{RecurringTrigger, TriggerStats};
pub use watchdog::{Watchdog, WatchdogStatus};

// Re-export logging initialization
pub use logging::init_logging;
