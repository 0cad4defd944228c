//! Driver configuration validation
//!
//! Rules:
//! - device path non-empty
//! - poll_timeout_ms within 1..=10000
//! - channel_capacity > 0

use contracts::{ConfigError, DriverConfig};

/// Upper bound for the readiness wait; keeps stop latency bounded
pub const MAX_POLL_TIMEOUT_MS: u64 = 10_000;

/// Validate a DriverConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &DriverConfig) -> Result<(), ConfigError> {
    validate_device(config)?;
    validate_acquisition(config)?;
    Ok(())
}

fn validate_device(config: &DriverConfig) -> Result<(), ConfigError> {
    if config.device.as_os_str().is_empty() {
        return Err(ConfigError::validation("device", "device path cannot be empty"));
    }
    Ok(())
}

fn validate_acquisition(config: &DriverConfig) -> Result<(), ConfigError> {
    let acquisition = &config.acquisition;

    if acquisition.poll_timeout_ms == 0 || acquisition.poll_timeout_ms > MAX_POLL_TIMEOUT_MS {
        return Err(ConfigError::validation(
            "acquisition.poll_timeout_ms",
            format!(
                "poll_timeout_ms must be within 1..={MAX_POLL_TIMEOUT_MS}, got {}",
                acquisition.poll_timeout_ms
            ),
        ));
    }

    if acquisition.channel_capacity == 0 {
        return Err(ConfigError::validation(
            "acquisition.channel_capacity",
            "channel_capacity must be > 0",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&DriverConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_device_path() {
        let config = DriverConfig {
            device: PathBuf::new(),
            ..Default::default()
        };
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "device"));
    }

    #[test]
    fn test_poll_timeout_bounds() {
        let mut config = DriverConfig::default();
        config.acquisition.poll_timeout_ms = 0;
        assert!(validate(&config).is_err());

        config.acquisition.poll_timeout_ms = MAX_POLL_TIMEOUT_MS + 1;
        assert!(validate(&config).is_err());

        config.acquisition.poll_timeout_ms = MAX_POLL_TIMEOUT_MS;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_capacity() {
        let mut config = DriverConfig::default();
        config.acquisition.channel_capacity = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }
}
