//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use std::path::Path;

use config_loader::ConfigLoader;
use contracts::DriverConfig;
use tracing::info;

use crate::error::CliError;

/// Load the driver configuration, or defaults when no file is given
fn load_driver_config(path: Option<&Path>) -> Result<DriverConfig, CliError> {
    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        return Ok(DriverConfig::default());
    };

    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }

    info!(config = %path.display(), "Loading configuration");
    Ok(ConfigLoader::load_from_path(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = load_driver_config(None).unwrap();
        assert_eq!(config.acquisition.poll_timeout_ms, 1000);
    }

    #[test]
    fn test_missing_file() {
        let err = load_driver_config(Some(Path::new("/nonexistent/vive-imu.toml"))).unwrap_err();
        assert!(matches!(err, CliError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[acquisition]\nchannel_capacity = 0\n").unwrap();
        let err = load_driver_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, CliError::ConfigValidation { .. }));
    }
}
