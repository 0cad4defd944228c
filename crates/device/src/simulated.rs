//! Simulated headset wiring for running without hardware.

use contracts::{
    FirmwareVersion, TransportError, CONFIG_READ_REPORT_ID, CONFIG_REPORT_LEN,
    CONFIG_START_REPORT_ID, FIRMWARE_VERSION_REPORT_ID,
};
use ingestion::MockTransport;

use crate::config_blob::{compress_config, config_read_reports};
use crate::firmware::encode_firmware_report;

/// Calibration document served by the simulated headset
///
/// Accelerometer scale maps 4096 LSB to 1 g in m/s²; gyroscope scale is the
/// ±2000 °/s range in rad/s.
pub const SIMULATED_CALIBRATION: &str = r#"{
    "acc_bias": [0.0, 0.0, 0.0],
    "acc_scale": [0.0023941, 0.0023941, 0.0023941],
    "gyro_bias": [0.0, 0.0, 0.0],
    "gyro_scale": [0.0010653, 0.0010653, 0.0010653],
    "device_class": "simulated"
}"#;

pub fn simulated_firmware() -> FirmwareVersion {
    FirmwareVersion {
        firmware_version: 1_000,
        string1: "simulated".to_string(),
        string2: "lighthouse".to_string(),
        fpga_version_major: 1,
        fpga_version_minor: 0,
        hardware_revision: 1,
        hardware_version_major: 1,
        hardware_version_minor: 0,
        hardware_version_micro: 0,
    }
}

/// Mock transport answering the startup feature reports
///
/// Serves the firmware report and the compressed `calibration` document.
/// Periodic reports are added by the caller (e.g. `with_generator`).
pub fn simulated_transport(calibration: &[u8]) -> Result<MockTransport, TransportError> {
    let compressed = compress_config(calibration)?;

    let mut start = [0u8; CONFIG_REPORT_LEN];
    start[0] = CONFIG_START_REPORT_ID;

    let transport = MockTransport::new()
        .with_feature(
            FIRMWARE_VERSION_REPORT_ID,
            encode_firmware_report(&simulated_firmware()),
        )
        .with_feature(CONFIG_START_REPORT_ID, start);

    Ok(config_read_reports(&compressed)
        .into_iter()
        .fold(transport, |transport, report| {
            transport.with_feature(CONFIG_READ_REPORT_ID, report)
        }))
}
