//! Startup sequence
//!
//! Ordered and fail-fast: open, firmware version, calibration, lighthouse
//! receiver. Nothing is spawned here; the caller only starts acquisition when
//! every step succeeded.

use std::path::Path;

use config_loader::{CalibrationStore, ConfigLoader};
use contracts::{
    DriverResult, FirmwareVersion, Transport, TransportError, LIGHTHOUSE_ENABLE_REPORT,
    LIGHTHOUSE_RESET_REPORT,
};
use tracing::{debug, info, instrument, warn};

use crate::config_blob::read_config_blob;
use crate::firmware::read_firmware_version;

/// What startup learned about the device
#[derive(Debug, Clone)]
pub struct StartupReport {
    pub firmware: FirmwareVersion,
    pub calibration: CalibrationStore,
}

/// Run the startup steps in order, stopping at the first failure
#[instrument(
    name = "headset_imu_startup",
    skip(transport, calibration_override),
    fields(overridden = calibration_override.is_some())
)]
pub fn run_startup<T: Transport + ?Sized>(
    transport: &mut T,
    device: &str,
    calibration_override: Option<&Path>,
) -> DriverResult<StartupReport> {
    if !transport.is_open() {
        transport.open().inspect_err(|e| {
            warn!(device = %device, error = %e, "failed to open device");
        })?;
    }

    let firmware = read_firmware_version(transport).inspect_err(|e| {
        warn!(device = %device, error = %e, "failed to get firmware version");
    })?;
    info!(device = %device, firmware = %firmware, "firmware version");

    let calibration = read_calibration(transport, device, calibration_override)?;
    debug!(
        device = %device,
        acc_scale = ?calibration.accel_scale(),
        gyro_scale = ?calibration.gyro_scale(),
        "calibration loaded"
    );

    enable_lighthouse(transport).inspect_err(|e| {
        warn!(device = %device, error = %e, "failed to enable lighthouse receiver");
    })?;

    info!(device = %device, "startup complete");
    Ok(StartupReport {
        firmware,
        calibration,
    })
}

/// Download the device configuration, or read it from `calibration_override`
pub fn read_calibration<T: Transport + ?Sized>(
    transport: &mut T,
    device: &str,
    calibration_override: Option<&Path>,
) -> DriverResult<CalibrationStore> {
    let calibration = match calibration_override {
        Some(path) => {
            info!(device = %device, path = %path.display(), "using calibration override");
            ConfigLoader::load_calibration_from_path(path)
        }
        None => {
            let blob = read_config_blob(transport).inspect_err(|e| {
                warn!(device = %device, error = %e, "failed to read configuration");
            })?;
            CalibrationStore::load(&blob)
        }
    };

    let calibration = calibration.inspect_err(|e| {
        warn!(device = %device, error = %e, "failed to load calibration");
    })?;
    Ok(calibration)
}

/// Enable the lighthouse receiver: enable, then reset the channel registers
pub fn enable_lighthouse<T: Transport + ?Sized>(transport: &mut T) -> Result<(), TransportError> {
    transport.send_feature_report(&LIGHTHOUSE_ENABLE_REPORT)?;
    transport.send_feature_report(&LIGHTHOUSE_RESET_REPORT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{simulated_transport, SIMULATED_CALIBRATION};
    use contracts::{ConfigError, DriverError};
    use ingestion::MockTransport;
    use std::io::Write;

    #[test]
    fn test_full_startup() {
        let mut transport = simulated_transport(SIMULATED_CALIBRATION.as_bytes()).unwrap();
        let handle = transport.handle();

        let report = run_startup(&mut transport, "hmd", None).unwrap();
        assert!(handle.is_open());
        assert_eq!(report.firmware.string2, "lighthouse");
        assert_eq!(
            handle.sent_features(),
            vec![LIGHTHOUSE_ENABLE_REPORT.to_vec(), LIGHTHOUSE_RESET_REPORT.to_vec()]
        );
    }

    #[test]
    fn test_missing_gyro_scale_aborts() {
        let blob = br#"{"acc_bias":[0,0,0],"acc_scale":[1,1,1],"gyro_bias":[0,0,0]}"#;
        let mut transport = simulated_transport(blob).unwrap();
        let handle = transport.handle();

        let err = run_startup(&mut transport, "hmd", None).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Config(ConfigError::MissingField { ref field }) if field == "gyro_scale"
        ));
        assert!(handle.sent_features().is_empty());
    }

    #[test]
    fn test_open_failure() {
        let mut transport = MockTransport::new().fail_open();
        let err = run_startup(&mut transport, "hmd", None).unwrap_err();
        assert!(matches!(err, DriverError::Transport(TransportError::Open { .. })));
    }

    #[test]
    fn test_firmware_failure_skips_calibration() {
        let mut transport = MockTransport::new().opened();
        let handle = transport.handle();
        let err = run_startup(&mut transport, "hmd", None).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Transport(TransportError::GetFeature { report_id: 0x05, .. })
        ));
        assert!(handle.sent_features().is_empty());
    }

    #[test]
    fn test_lighthouse_failure() {
        let mut transport = simulated_transport(SIMULATED_CALIBRATION.as_bytes())
            .unwrap()
            .fail_send_feature(0x07);
        let err = run_startup(&mut transport, "hmd", None).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Transport(TransportError::SendFeature { report_id: 0x07, .. })
        ));
    }

    #[test]
    fn test_calibration_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"acc_bias":[0,0,0],"acc_scale":[1,1,1],"gyro_bias":[0,0,0],"gyro_scale":[3,3,3]}"#,
        )
        .unwrap();

        // device config is broken; the override wins
        let mut transport = simulated_transport(b"{}").unwrap();
        let report = run_startup(&mut transport, "hmd", Some(file.path())).unwrap();
        assert_eq!(report.calibration.gyro_scale().x, 3.0);
    }
}
