use tracing::{error, info};

use crate::config::WatchdogConfig;

pub fn log_app_startup() {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION")
    );
}

pub fn log_app_shutdown() {
    info!(event = "core.app.shutdown_started");
}

pub fn log_app_error(error: &dyn std::error::Error) {
    error!(
        event = "core.app.error_occurred",
        error = %error,
        error_type = std::any::type_name_of_val(error)
    );
}

pub fn log_watchdog_installed(config: &WatchdogConfig) {
    info!(
        event = "core.watchdog.install_completed",
        target_region = %config.poll.target_region(),
        control = %config.trigger.control(),
        retry_delay_ms = config.poll.retry_delay_ms(),
        cadence_ms = config.trigger.cadence_ms(),
        document_loaded_delay_ms = config.poll.document_loaded_delay_ms()
    );
}

pub fn log_watchdog_stopped() {
    info!(event = "core.watchdog.stop_completed");
}
