//! Calibration store
//!
//! Per-axis bias and scale for the accelerometer and gyroscope, decoded once
//! from the JSON document stored in the headset.

use contracts::{ConfigError, Vector3};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names in the device configuration document
pub const ACC_BIAS: &str = "acc_bias";
pub const ACC_SCALE: &str = "acc_scale";
pub const GYRO_BIAS: &str = "gyro_bias";
pub const GYRO_SCALE: &str = "gyro_scale";

/// Immutable calibration store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationStore {
    acc_bias: Vector3,
    acc_scale: Vector3,
    gyro_bias: Vector3,
    gyro_scale: Vector3,
}

impl CalibrationStore {
    /// Decode the raw configuration blob
    ///
    /// # Errors
    /// - `ConfigError::Malformed` if the blob is not a JSON object
    /// - `ConfigError::MissingField` if any of the four vectors is absent or
    ///   not a 3-element numeric array
    pub fn load(raw: &[u8]) -> Result<Self, ConfigError> {
        // Blobs read back from the device may carry trailing NUL padding
        let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);

        let document: Value =
            serde_json::from_slice(&raw[..end]).map_err(|e| ConfigError::Malformed {
                message: format!("JSON parse error: {e}"),
                source: Some(Box::new(e)),
            })?;

        let object = document
            .as_object()
            .ok_or_else(|| ConfigError::malformed("top-level value is not an object"))?;

        Ok(Self {
            acc_bias: vec3_member(object, ACC_BIAS)?,
            acc_scale: vec3_member(object, ACC_SCALE)?,
            gyro_bias: vec3_member(object, GYRO_BIAS)?,
            gyro_scale: vec3_member(object, GYRO_SCALE)?,
        })
    }

    /// Build from explicit vectors
    pub fn from_parts(
        acc_bias: Vector3,
        acc_scale: Vector3,
        gyro_bias: Vector3,
        gyro_scale: Vector3,
    ) -> Self {
        Self {
            acc_bias,
            acc_scale,
            gyro_bias,
            gyro_scale,
        }
    }

    /// Zero bias, unit scale
    pub fn identity() -> Self {
        Self::from_parts(Vector3::ZERO, Vector3::ONE, Vector3::ZERO, Vector3::ONE)
    }

    pub fn accel_bias(&self) -> Vector3 {
        self.acc_bias
    }

    pub fn accel_scale(&self) -> Vector3 {
        self.acc_scale
    }

    pub fn gyro_bias(&self) -> Vector3 {
        self.gyro_bias
    }

    pub fn gyro_scale(&self) -> Vector3 {
        self.gyro_scale
    }
}

fn vec3_member(object: &Map<String, Value>, field: &str) -> Result<Vector3, ConfigError> {
    let values = object
        .get(field)
        .and_then(Value::as_array)
        .filter(|array| array.len() == 3)
        .ok_or_else(|| ConfigError::missing_field(field))?;

    let mut components = [0.0; 3];
    for (component, value) in components.iter_mut().zip(values) {
        *component = value
            .as_f64()
            .ok_or_else(|| ConfigError::missing_field(field))?;
    }

    Ok(Vector3::from(components))
}
