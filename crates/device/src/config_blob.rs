//! Device configuration download.
//!
//! The headset stores its configuration as zlib-compressed JSON. Reading
//! feature report `0x10` rewinds the read pointer; every `0x11` report then
//! carries `[id, len, payload[62]]` until a report with `len == 0`.

use std::io::{Read, Write};

use contracts::{
    Transport, TransportError, CONFIG_READ_REPORT_ID, CONFIG_REPORT_LEN, CONFIG_START_REPORT_ID,
    MAX_CONFIG_COMPRESSED_LEN, MAX_CONFIG_LEN,
};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::debug;

/// Payload bytes per `0x11` report
pub const CONFIG_CHUNK_LEN: usize = CONFIG_REPORT_LEN - 2;

/// Download and inflate the configuration document
///
/// # Errors
/// - Transport failure on any feature read
/// - `TransportError::ShortFeature` when a report is shorter than its length byte claims
/// - `TransportError::ConfigTooLarge` past 4096 compressed or 32768 inflated bytes
/// - `TransportError::Inflate` on a corrupt zlib stream
pub fn read_config_blob<T: Transport + ?Sized>(transport: &mut T) -> Result<Vec<u8>, TransportError> {
    let mut buf = [0u8; CONFIG_REPORT_LEN];
    buf[0] = CONFIG_START_REPORT_ID;
    transport.get_feature_report(&mut buf)?;

    let mut compressed = Vec::with_capacity(MAX_CONFIG_COMPRESSED_LEN);
    loop {
        buf = [0u8; CONFIG_REPORT_LEN];
        buf[0] = CONFIG_READ_REPORT_ID;

        let len = transport.get_feature_report(&mut buf)?;
        if len < 2 {
            return Err(TransportError::ShortFeature {
                report_id: CONFIG_READ_REPORT_ID,
                expected: 2,
                actual: len,
            });
        }

        let chunk = usize::from(buf[1]);
        if chunk == 0 {
            break;
        }
        if chunk > CONFIG_CHUNK_LEN || len < chunk + 2 {
            return Err(TransportError::ShortFeature {
                report_id: CONFIG_READ_REPORT_ID,
                expected: chunk + 2,
                actual: len,
            });
        }
        if compressed.len() + chunk > MAX_CONFIG_COMPRESSED_LEN {
            return Err(TransportError::ConfigTooLarge {
                max: MAX_CONFIG_COMPRESSED_LEN,
            });
        }

        compressed.extend_from_slice(&buf[2..2 + chunk]);
    }

    let config = inflate(&compressed)?;
    debug!(
        compressed = compressed.len(),
        inflated = config.len(),
        "device configuration downloaded"
    );
    Ok(config)
}

fn inflate(compressed: &[u8]) -> Result<Vec<u8>, TransportError> {
    let mut config = Vec::new();
    ZlibDecoder::new(compressed)
        .take(MAX_CONFIG_LEN as u64 + 1)
        .read_to_end(&mut config)
        .map_err(TransportError::Inflate)?;

    if config.len() > MAX_CONFIG_LEN {
        return Err(TransportError::ConfigTooLarge {
            max: MAX_CONFIG_LEN,
        });
    }
    Ok(config)
}

/// Compress a configuration document the way the headset stores it
pub fn compress_config(document: &[u8]) -> Result<Vec<u8>, TransportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(document).map_err(TransportError::Inflate)?;
    encoder.finish().map_err(TransportError::Inflate)
}

/// Split compressed data into the `0x11` reports a headset returns, end marker included
pub fn config_read_reports(compressed: &[u8]) -> Vec<[u8; CONFIG_REPORT_LEN]> {
    let mut reports: Vec<[u8; CONFIG_REPORT_LEN]> = compressed
        .chunks(CONFIG_CHUNK_LEN)
        .map(|chunk| {
            let mut report = [0u8; CONFIG_REPORT_LEN];
            report[0] = CONFIG_READ_REPORT_ID;
            report[1] = chunk.len() as u8;
            report[2..2 + chunk.len()].copy_from_slice(chunk);
            report
        })
        .collect();

    let mut end = [0u8; CONFIG_REPORT_LEN];
    end[0] = CONFIG_READ_REPORT_ID;
    reports.push(end);
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestion::MockTransport;

    fn transport_serving(compressed: &[u8]) -> MockTransport {
        let mut start = [0u8; CONFIG_REPORT_LEN];
        start[0] = CONFIG_START_REPORT_ID;
        config_read_reports(compressed)
            .into_iter()
            .fold(
                MockTransport::new().with_feature(CONFIG_START_REPORT_ID, start),
                |transport, report| transport.with_feature(CONFIG_READ_REPORT_ID, report),
            )
            .opened()
    }

    #[test]
    fn test_download_multi_chunk() {
        let samples: Vec<String> = (0..300u32).map(|i| (i * 7919 % 1000).to_string()).collect();
        let document = format!(
            r#"{{"acc_bias":[0,0,0],"acc_scale":[1,1,1],"gyro_bias":[0,0,0],"gyro_scale":[1,1,1],"lighthouse_samples":[{}]}}"#,
            samples.join(",")
        );
        let compressed = compress_config(document.as_bytes()).unwrap();
        assert!(compressed.len() > CONFIG_CHUNK_LEN);

        let mut transport = transport_serving(&compressed);
        let config = read_config_blob(&mut transport).unwrap();
        assert_eq!(config, document.as_bytes());
    }

    #[test]
    fn test_compressed_size_bound() {
        // 70 full chunks is past 4096 bytes
        let oversized = vec![0xaau8; CONFIG_CHUNK_LEN * 70];
        let mut transport = transport_serving(&oversized);
        let err = read_config_blob(&mut transport).unwrap_err();
        assert!(matches!(err, TransportError::ConfigTooLarge { max: 4096 }));
    }

    #[test]
    fn test_corrupt_stream() {
        let mut transport = transport_serving(b"definitely not zlib");
        let err = read_config_blob(&mut transport).unwrap_err();
        assert!(matches!(err, TransportError::Inflate(_)));
    }

    #[test]
    fn test_start_report_failure() {
        let mut transport = MockTransport::new().opened();
        let err = read_config_blob(&mut transport).unwrap_err();
        assert!(matches!(
            err,
            TransportError::GetFeature {
                report_id: 0x10,
                ..
            }
        ));
    }

    #[test]
    fn test_truncated_chunk() {
        let mut report = [0u8; CONFIG_REPORT_LEN];
        report[0] = CONFIG_READ_REPORT_ID;
        report[1] = 40;
        let mut transport = MockTransport::new()
            .with_feature(CONFIG_START_REPORT_ID, vec![CONFIG_START_REPORT_ID])
            .with_feature(CONFIG_READ_REPORT_ID, report[..10].to_vec())
            .opened();

        let err = read_config_blob(&mut transport).unwrap_err();
        assert!(matches!(
            err,
            TransportError::ShortFeature {
                expected: 42,
                actual: 10,
                ..
            }
        ));
    }
}
