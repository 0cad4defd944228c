//! HID report identifiers and fixed layouts shared by the transport,
//! the acquisition loop and the startup sequence.

use serde::{Deserialize, Serialize};

/// Periodic IMU report tag
pub const IMU_REPORT_ID: u8 = 0x20;

/// Size of a valid IMU report: tag + 3 packed sample records
pub const IMU_REPORT_LEN: usize = 52;

/// Packed size of one sample record (3×i16 + 3×i16 + u32 + u8)
pub const IMU_SAMPLE_LEN: usize = 17;

/// Number of sample slots per IMU report
pub const IMU_SLOTS: usize = 3;

/// Receive buffer size for periodic reports (USB full-speed interrupt limit)
pub const MAX_REPORT_LEN: usize = 64;

/// Firmware version feature report
pub const FIRMWARE_VERSION_REPORT_ID: u8 = 0x05;

/// Size of the firmware version feature report
pub const FIRMWARE_VERSION_REPORT_LEN: usize = 64;

/// Starts a device configuration download
pub const CONFIG_START_REPORT_ID: u8 = 0x10;

/// Returns the next chunk of the device configuration
pub const CONFIG_READ_REPORT_ID: u8 = 0x11;

/// Size of both configuration feature reports
pub const CONFIG_REPORT_LEN: usize = 64;

/// Upper bound on the compressed configuration blob
pub const MAX_CONFIG_COMPRESSED_LEN: usize = 4096;

/// Upper bound on the inflated configuration document
pub const MAX_CONFIG_LEN: usize = 32768;

/// First Lighthouse receiver enable write
pub const LIGHTHOUSE_ENABLE_REPORT: [u8; 5] = [0x04, 0x00, 0x00, 0x00, 0x00];

/// Second write; resets the receiver registers so idle channels read 0xff
pub const LIGHTHOUSE_RESET_REPORT: [u8; 5] = [0x07, 0x02, 0x00, 0x00, 0x00];

/// Decoded firmware version feature report
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub firmware_version: u32,
    pub string1: String,
    pub string2: String,
    pub fpga_version_major: u8,
    pub fpga_version_minor: u8,
    pub hardware_revision: u8,
    pub hardware_version_major: u8,
    pub hardware_version_minor: u8,
    pub hardware_version_micro: u8,
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "firmware {} {}@{} FPGA {}.{}, hardware revision {} rev {}.{}.{}",
            self.firmware_version,
            self.string1,
            self.string2,
            self.fpga_version_major,
            self.fpga_version_minor,
            self.hardware_revision,
            self.hardware_version_major,
            self.hardware_version_minor,
            self.hardware_version_micro
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_layout_is_consistent() {
        assert_eq!(1 + IMU_SLOTS * IMU_SAMPLE_LEN, IMU_REPORT_LEN);
        assert!(IMU_REPORT_LEN <= MAX_REPORT_LEN);
    }

    #[test]
    fn test_lighthouse_opcodes() {
        assert_eq!(LIGHTHOUSE_ENABLE_REPORT[0], 0x04);
        assert_eq!(&LIGHTHOUSE_RESET_REPORT[..2], &[0x07, 0x02]);
        assert!(LIGHTHOUSE_RESET_REPORT[2..].iter().all(|&b| b == 0));
    }
}
