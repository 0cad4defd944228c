//! Driver configuration contracts shared across crates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Device name used in log fields
    #[serde(default = "default_name")]
    pub name: String,

    /// hidraw device node (e.g. /dev/hidraw0)
    #[serde(default = "default_device")]
    pub device: PathBuf,

    /// Calibration blob read from disk instead of the headset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_override: Option<PathBuf>,

    /// Acquisition loop settings
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
}

fn default_name() -> String {
    "Vive Headset IMU".to_string()
}

fn default_device() -> PathBuf {
    PathBuf::from("/dev/hidraw0")
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            device: default_device(),
            calibration_override: None,
            acquisition: AcquisitionConfig::default(),
        }
    }
}

/// Acquisition loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Readiness wait bound in milliseconds
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Calibrated sample channel capacity
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// What to do when the consumer falls behind
    #[serde(default)]
    pub drop_policy: DropPolicy,
}

fn default_poll_timeout_ms() -> u64 {
    1000
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout_ms(),
            channel_capacity: default_channel_capacity(),
            drop_policy: DropPolicy::default(),
        }
    }
}

impl AcquisitionConfig {
    pub fn poll_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_timeout_ms)
    }
}

/// Backpressure policy when the sample channel is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Drop the sample that did not fit
    #[default]
    DropNewest,
    /// Evict the oldest queued sample to make room
    DropOldest,
}
