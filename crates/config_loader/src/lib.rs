//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Decode the headset's calibration document into a `CalibrationStore`
//! - Parse TOML/JSON driver configuration files
//! - Validate driver configuration
//!
//! # Example
//!
//! ```no_run
//! use config_loader::{CalibrationStore, ConfigLoader};
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("vive-imu.toml")).unwrap();
//! println!("device: {}", config.device.display());
//!
//! let calibration = ConfigLoader::load_calibration_from_path(Path::new("calib.json")).unwrap();
//! println!("gyro scale: {:?}", calibration.gyro_scale());
//! ```

mod calibration;
mod parser;
mod validator;

pub use calibration::{CalibrationStore, ACC_BIAS, ACC_SCALE, GYRO_BIAS, GYRO_SCALE};
pub use contracts::DriverConfig;
pub use parser::ConfigFormat;
pub use validator::MAX_POLL_TIMEOUT_MS;

use contracts::ConfigError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load driver configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<DriverConfig, ConfigError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load driver configuration from string
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<DriverConfig, ConfigError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate an already-built configuration (e.g. after CLI overrides)
    pub fn validate(config: &DriverConfig) -> Result<(), ConfigError> {
        validator::validate(config)
    }

    /// Load a calibration document saved to disk
    pub fn load_calibration_from_path(path: &Path) -> Result<CalibrationStore, ConfigError> {
        let raw = std::fs::read(path)?;
        CalibrationStore::load(&raw)
    }

    /// Serialize DriverConfig to TOML string
    pub fn to_toml(config: &DriverConfig) -> Result<String, ConfigError> {
        toml::to_string_pretty(config)
            .map_err(|e| ConfigError::malformed(format!("TOML serialize error: {e}")))
    }

    /// Serialize DriverConfig to JSON string
    pub fn to_json(config: &DriverConfig) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::malformed(format!("JSON serialize error: {e}")))
    }

    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::malformed("cannot determine file format from extension"))?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::malformed(format!("unsupported config format: .{ext}")))
    }
}
