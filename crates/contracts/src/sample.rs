//! IMU sample types
//!
//! Raw integer samples as they leave the report buffer, and the calibrated
//! physical-unit samples handed to consumers.

use std::ops::{Mul, Sub};

use serde::{Deserialize, Serialize};

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Widen a raw signed 16-bit triplet, axis order preserved
    pub fn from_raw(raw: [i16; 3]) -> Self {
        Self::new(f64::from(raw[0]), f64::from(raw[1]), f64::from(raw[2]))
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Component-wise product
    pub fn component_mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }

    pub fn norm(self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul for Vector3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.component_mul(rhs)
    }
}

/// Raw sample copied out of one report slot
///
/// Host byte order; little-endian conversion happens when the slot is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSample {
    /// Accelerometer axes (x, y, z)
    pub accel: [i16; 3],

    /// Gyroscope axes (x, y, z)
    pub gyro: [i16; 3],

    /// Device tick count
    pub time: u32,

    /// Rolling 8-bit sequence number
    pub seq: u8,
}

/// Calibrated sample in physical units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibratedSample {
    /// Accelerometer, calibrated
    pub accelerometer: Vector3,

    /// Gyroscope, calibrated
    pub gyroscope: Vector3,

    /// Device tick count, unconverted
    pub time: u32,

    /// Sequence number of the originating raw sample
    pub seq: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_preserves_axis_order() {
        let v = Vector3::from_raw([-1, 2, i16::MIN]);
        assert_eq!(v.to_array(), [-1.0, 2.0, -32768.0]);
    }

    #[test]
    fn test_component_ops() {
        let a = Vector3::new(3.0, 5.0, 7.0);
        let b = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(a - b, Vector3::new(2.0, 3.0, 4.0));
        assert_eq!(a * b, Vector3::new(3.0, 10.0, 21.0));
    }

    #[test]
    fn test_calibrated_sample_serializes() {
        let sample = CalibratedSample {
            accelerometer: Vector3::new(0.0, 0.0, 9.81),
            gyroscope: Vector3::ZERO,
            time: 1234,
            seq: 7,
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("\"seq\":7"));
    }
}
