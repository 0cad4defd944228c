//! # Device
//!
//! Vive headset IMU driver.
//!
//! Responsibilities:
//! - hidraw transport (Linux)
//! - Firmware version readout and configuration download
//! - Fail-fast startup sequence
//! - Driver lifecycle behind the `Device` trait, one worker thread per device
//! - Simulated headset for running without hardware
//!
//! ## Example
//!
//! ```no_run
//! use contracts::{Device, DriverConfig};
//! use device::HeadsetImu;
//!
//! # fn main() -> contracts::DriverResult<()> {
//! let mut driver = HeadsetImu::hidraw(DriverConfig::default());
//! let samples = driver.take_receiver().expect("receiver");
//!
//! driver.start()?;
//! driver.run()?;
//! while let Ok(sample) = samples.recv_blocking() {
//!     println!("{} {:?}", sample.seq, sample.gyroscope);
//! }
//! driver.stop()?;
//! # Ok(())
//! # }
//! ```

mod config_blob;
mod driver;
mod firmware;
#[cfg(target_os = "linux")]
mod hidraw;
mod simulated;
mod startup;

pub use config_blob::{compress_config, config_read_reports, read_config_blob, CONFIG_CHUNK_LEN};
pub use driver::HeadsetImu;
pub use firmware::{decode_firmware_report, encode_firmware_report, read_firmware_version};
#[cfg(target_os = "linux")]
pub use hidraw::HidrawTransport;
pub use simulated::{simulated_firmware, simulated_transport, SIMULATED_CALIBRATION};
pub use startup::{enable_lighthouse, read_calibration, run_startup, StartupReport};

#[cfg(target_os = "linux")]
impl HeadsetImu<HidrawTransport> {
    /// Driver for the hidraw node named in `config.device`
    pub fn hidraw(config: contracts::DriverConfig) -> Self {
        let transport = HidrawTransport::new(config.device.clone());
        Self::new(config, transport)
    }
}
