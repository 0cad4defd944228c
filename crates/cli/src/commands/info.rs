//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::CalibrationStore;
use contracts::{FirmwareVersion, Transport, Vector3};
use device::{read_calibration, read_firmware_version};
use serde::Serialize;
use tracing::info;

use super::load_driver_config;
use crate::cli::InfoArgs;
use crate::pipeline::SampleSource;

/// Headset info for JSON output
#[derive(Serialize)]
struct HeadsetInfo {
    name: String,
    device: String,
    simulated: bool,
    firmware: FirmwareVersion,
    calibration: CalibrationInfo,
}

#[derive(Serialize)]
struct CalibrationInfo {
    source: String,
    acc_bias: Vector3,
    acc_scale: Vector3,
    gyro_bias: Vector3,
    gyro_scale: Vector3,
}

/// Execute the `info` command
///
/// Reads the firmware version and the calibration, without enabling the
/// lighthouse receiver or starting acquisition.
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let mut config = load_driver_config(args.config.as_deref())?;
    if let Some(ref device) = args.device {
        config.device = device.clone();
    }

    let source = SampleSource::from_flags(args.simulate, 1);
    let mut transport = source.transport(&config)?;

    info!(device = %config.device.display(), "Reading headset info");
    transport
        .open()
        .with_context(|| format!("Failed to open {}", config.device.display()))?;

    let firmware =
        read_firmware_version(&mut transport).context("Failed to read firmware version")?;
    let calibration = read_calibration(
        &mut transport,
        &config.name,
        config.calibration_override.as_deref(),
    )
    .context("Failed to read calibration")?;

    let calibration_source = match config.calibration_override {
        Some(ref path) => path.display().to_string(),
        None => "device".to_string(),
    };

    let headset = HeadsetInfo {
        name: config.name.clone(),
        device: config.device.display().to_string(),
        simulated: args.simulate,
        firmware,
        calibration: calibration_info(&calibration, calibration_source),
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&headset).context("Failed to serialize headset info")?;
        println!("{}", json);
    } else {
        print_headset_info(&headset);
    }

    Ok(())
}

fn calibration_info(store: &CalibrationStore, source: String) -> CalibrationInfo {
    CalibrationInfo {
        source,
        acc_bias: store.accel_bias(),
        acc_scale: store.accel_scale(),
        gyro_bias: store.gyro_bias(),
        gyro_scale: store.gyro_scale(),
    }
}

fn print_headset_info(headset: &HeadsetInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Vive Headset IMU                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🎧 Device");
    println!("   ├─ Name: {}", headset.name);
    println!("   ├─ Node: {}", headset.device);
    println!("   └─ Simulated: {}", headset.simulated);

    let fw = &headset.firmware;
    println!("\n🔧 Firmware");
    println!("   ├─ Version: {}", fw.firmware_version);
    println!("   ├─ Build: {}@{}", fw.string1, fw.string2);
    println!(
        "   ├─ FPGA: {}.{}",
        fw.fpga_version_major, fw.fpga_version_minor
    );
    println!(
        "   └─ Hardware: revision {} ({}.{}.{})",
        fw.hardware_revision,
        fw.hardware_version_major,
        fw.hardware_version_minor,
        fw.hardware_version_micro
    );

    let cal = &headset.calibration;
    println!("\n📐 Calibration ({})", cal.source);
    println!("   ├─ acc_bias:   {:?}", cal.acc_bias);
    println!("   ├─ acc_scale:  {:?}", cal.acc_scale);
    println!("   ├─ gyro_bias:  {:?}", cal.gyro_bias);
    println!("   └─ gyro_scale: {:?}", cal.gyro_scale);

    println!();
}
