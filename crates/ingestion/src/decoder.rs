//! Raw to physical sample conversion.

use config_loader::CalibrationStore;
use contracts::{CalibratedSample, RawSample, Vector3};

/// Apply per-axis bias and scale: `(raw - bias) * scale`
///
/// The device tick is passed through unconverted.
#[inline]
pub fn decode(raw: &RawSample, calibration: &CalibrationStore) -> CalibratedSample {
    let accelerometer =
        (Vector3::from_raw(raw.accel) - calibration.accel_bias()) * calibration.accel_scale();
    let gyroscope =
        (Vector3::from_raw(raw.gyro) - calibration.gyro_bias()) * calibration.gyro_scale();

    CalibratedSample {
        accelerometer,
        gyroscope,
        time: raw.time,
        seq: raw.seq,
    }
}
