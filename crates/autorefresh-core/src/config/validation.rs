use crate::config::types::WatchdogConfig;
use crate::errors::ConfigError;

/// Validate a merged configuration.
///
/// Selectors are already checked during deserialization; this covers the
/// numeric settings. A zero retry delay would spin the poll loop and a zero
/// cadence is not a valid timer period.
pub fn validate_config(config: &WatchdogConfig) -> Result<(), ConfigError> {
    if config.poll.retry_delay_ms() == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "poll.retry_delay_ms must be greater than 0".to_string(),
        });
    }

    if config.trigger.cadence_ms() == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "trigger.cadence_ms must be greater than 0".to_string(),
        });
    }

    Ok(())
}
