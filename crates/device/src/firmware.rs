//! Firmware version feature report (0x05).

use bytemuck::{Pod, Zeroable};
use contracts::{
    FirmwareVersion, Transport, TransportError, FIRMWARE_VERSION_REPORT_ID,
    FIRMWARE_VERSION_REPORT_LEN,
};

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct FirmwareReport {
    id: u8,
    firmware_version: [u8; 4],
    unknown1: [u8; 4],
    string1: [u8; 16],
    string2: [u8; 16],
    hardware_version_micro: u8,
    hardware_version_minor: u8,
    hardware_version_major: u8,
    hardware_revision: u8,
    unknown2: [u8; 4],
    fpga_version_minor: u8,
    fpga_version_major: u8,
    reserved: [u8; 13],
}

const _: () = assert!(std::mem::size_of::<FirmwareReport>() == FIRMWARE_VERSION_REPORT_LEN);

/// Text up to the first NUL
fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn fixed_string<const N: usize>(text: &str) -> [u8; N] {
    let mut out = [0u8; N];
    let len = text.len().min(N - 1);
    out[..len].copy_from_slice(&text.as_bytes()[..len]);
    out
}

/// Decode a complete firmware version report
pub fn decode_firmware_report(
    report: &[u8; FIRMWARE_VERSION_REPORT_LEN],
) -> FirmwareVersion {
    let wire: &FirmwareReport = bytemuck::from_bytes(report);
    FirmwareVersion {
        firmware_version: u32::from_le_bytes(wire.firmware_version),
        string1: c_string(&wire.string1),
        string2: c_string(&wire.string2),
        fpga_version_major: wire.fpga_version_major,
        fpga_version_minor: wire.fpga_version_minor,
        hardware_revision: wire.hardware_revision,
        hardware_version_major: wire.hardware_version_major,
        hardware_version_minor: wire.hardware_version_minor,
        hardware_version_micro: wire.hardware_version_micro,
    }
}

/// Build the report a headset would return for `version`
pub fn encode_firmware_report(version: &FirmwareVersion) -> [u8; FIRMWARE_VERSION_REPORT_LEN] {
    let wire = FirmwareReport {
        id: FIRMWARE_VERSION_REPORT_ID,
        firmware_version: version.firmware_version.to_le_bytes(),
        string1: fixed_string(&version.string1),
        string2: fixed_string(&version.string2),
        hardware_version_micro: version.hardware_version_micro,
        hardware_version_minor: version.hardware_version_minor,
        hardware_version_major: version.hardware_version_major,
        hardware_revision: version.hardware_revision,
        fpga_version_minor: version.fpga_version_minor,
        fpga_version_major: version.fpga_version_major,
        ..FirmwareReport::zeroed()
    };

    let mut out = [0u8; FIRMWARE_VERSION_REPORT_LEN];
    out.copy_from_slice(bytemuck::bytes_of(&wire));
    out
}

/// Read and decode the firmware version report
///
/// # Errors
/// - Transport failure
/// - `TransportError::ShortFeature` when fewer than 64 bytes come back
pub fn read_firmware_version<T: Transport + ?Sized>(
    transport: &mut T,
) -> Result<FirmwareVersion, TransportError> {
    let mut buf = [0u8; FIRMWARE_VERSION_REPORT_LEN];
    buf[0] = FIRMWARE_VERSION_REPORT_ID;

    let len = transport.get_feature_report(&mut buf)?;
    if len < FIRMWARE_VERSION_REPORT_LEN {
        return Err(TransportError::ShortFeature {
            report_id: FIRMWARE_VERSION_REPORT_ID,
            expected: FIRMWARE_VERSION_REPORT_LEN,
            actual: len,
        });
    }

    Ok(decode_firmware_report(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestion::MockTransport;

    fn version() -> FirmwareVersion {
        FirmwareVersion {
            firmware_version: 1_462_663_157,
            string1: "htcvrsoftware".to_string(),
            string2: "lighthouse".to_string(),
            fpga_version_major: 1,
            fpga_version_minor: 26,
            hardware_revision: 0x80,
            hardware_version_major: 2,
            hardware_version_minor: 0,
            hardware_version_micro: 3,
        }
    }

    #[test]
    fn test_field_offsets() {
        let report = encode_firmware_report(&version());
        assert_eq!(report[0], 0x05);
        assert_eq!(&report[1..5], &1_462_663_157u32.to_le_bytes());
        assert_eq!(&report[9..22], b"htcvrsoftware");
        assert_eq!(report[22], 0);
        assert_eq!(&report[25..35], b"lighthouse");
        assert_eq!(&report[41..45], &[3, 0, 2, 0x80]);
        assert_eq!(report[49], 26);
        assert_eq!(report[50], 1);
    }

    #[test]
    fn test_read_firmware_version() {
        let mut transport = MockTransport::new()
            .with_feature(0x05, encode_firmware_report(&version()))
            .opened();

        let decoded = read_firmware_version(&mut transport).unwrap();
        assert_eq!(decoded.string1, "htcvrsoftware");
        assert_eq!(decoded.hardware_revision, 0x80);
        assert!(decoded.to_string().contains("lighthouse"));
    }

    #[test]
    fn test_short_report() {
        let mut transport = MockTransport::new().with_feature(0x05, vec![0x05; 20]).opened();
        let err = read_firmware_version(&mut transport).unwrap_err();
        assert!(matches!(
            err,
            TransportError::ShortFeature {
                report_id: 0x05,
                actual: 20,
                ..
            }
        ));
    }

    #[test]
    fn test_unterminated_string() {
        let mut report = encode_firmware_report(&version());
        report[9..25].copy_from_slice(b"ABCDEFGHIJKLMNOP");
        assert_eq!(decode_firmware_report(&report).string1, "ABCDEFGHIJKLMNOP");
    }
}
