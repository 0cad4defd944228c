//! Error types for CLI operations.

use contracts::{ConfigError, DriverError};
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parsing error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    /// Headset startup failed
    #[error("Failed to start headset '{device}': {source}")]
    Startup {
        device: String,
        #[source]
        source: DriverError,
    },

    /// Graceful shutdown error
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
        }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    pub fn startup(device: impl Into<String>, source: DriverError) -> Self {
        Self::Startup {
            device: device.into(),
            source,
        }
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { .. } => Self::config_validation(err.to_string()),
            other => Self::config_parse(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_mapping() {
        let err = CliError::from(ConfigError::validation("acquisition.poll_timeout_ms", "zero"));
        assert!(matches!(err, CliError::ConfigValidation { .. }));

        let err = CliError::from(ConfigError::missing_field("gyro_scale"));
        assert!(matches!(err, CliError::ConfigParse { .. }));
        assert!(err.to_string().contains("gyro_scale"));
    }
}
