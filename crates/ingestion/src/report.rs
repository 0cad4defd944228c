//! Periodic IMU report layout.
//!
//! ```text
//! offset  size  field
//!      0     1  report id (0x20)
//!      1    17  sample slot 0
//!     18    17  sample slot 1
//!     35    17  sample slot 2
//!
//! slot:  acc x/y/z  i16 LE  (6)
//!        gyro x/y/z i16 LE  (6)
//!        time       u32 LE  (4)
//!        seq        u8      (1)
//! ```

use bytemuck::{Pod, Zeroable};
use contracts::{ProtocolError, RawSample, IMU_REPORT_ID, IMU_REPORT_LEN, IMU_SAMPLE_LEN, IMU_SLOTS};

/// One packed sample slot, byte-aligned so any buffer offset can be cast
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct WireSample {
    acc: [[u8; 2]; 3],
    gyro: [[u8; 2]; 3],
    time: [u8; 4],
    seq: u8,
}

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct WireReport {
    id: u8,
    samples: [WireSample; IMU_SLOTS],
}

const _: () = assert!(std::mem::size_of::<WireSample>() == IMU_SAMPLE_LEN);
const _: () = assert!(std::mem::size_of::<WireReport>() == IMU_REPORT_LEN);

impl WireSample {
    fn to_raw(self) -> RawSample {
        RawSample {
            accel: self.acc.map(i16::from_le_bytes),
            gyro: self.gyro.map(i16::from_le_bytes),
            time: u32::from_le_bytes(self.time),
            seq: self.seq,
        }
    }

    fn from_raw(raw: &RawSample) -> Self {
        Self {
            acc: raw.accel.map(i16::to_le_bytes),
            gyro: raw.gyro.map(i16::to_le_bytes),
            time: raw.time.to_le_bytes(),
            seq: raw.seq,
        }
    }
}

/// Validate a periodic report and copy its three slots out
///
/// # Errors
/// - `ProtocolError::InvalidLength` unless exactly 52 bytes were read
/// - `ProtocolError::UnexpectedReportId` unless byte 0 is `0x20`
pub fn parse_report(report: &[u8]) -> Result<[RawSample; IMU_SLOTS], ProtocolError> {
    if report.len() != IMU_REPORT_LEN {
        return Err(ProtocolError::InvalidLength {
            actual: report.len(),
            expected: IMU_REPORT_LEN,
        });
    }

    let wire: &WireReport = bytemuck::from_bytes(report);
    if wire.id != IMU_REPORT_ID {
        return Err(ProtocolError::UnexpectedReportId {
            actual: wire.id,
            expected: IMU_REPORT_ID,
        });
    }

    Ok(wire.samples.map(WireSample::to_raw))
}

/// Build the wire form of a periodic report
pub fn encode_report(samples: &[RawSample; IMU_SLOTS]) -> [u8; IMU_REPORT_LEN] {
    let wire = WireReport {
        id: IMU_REPORT_ID,
        samples: [
            WireSample::from_raw(&samples[0]),
            WireSample::from_raw(&samples[1]),
            WireSample::from_raw(&samples[2]),
        ],
    };

    let mut out = [0u8; IMU_REPORT_LEN];
    out.copy_from_slice(bytemuck::bytes_of(&wire));
    out
}
