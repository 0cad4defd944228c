//! Report source selection.

use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{DriverConfig, Transport};
use device::{simulated_transport, SIMULATED_CALIBRATION};
use ingestion::SimulatedHeadset;
use tracing::info;

/// Where periodic IMU reports come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSource {
    /// Linux hidraw node named in the driver configuration
    Hidraw,
    /// In-process headset producing one new sample per report
    Simulated { rate_hz: u32 },
}

impl SampleSource {
    pub fn from_flags(simulate: bool, rate_hz: u32) -> Self {
        if simulate {
            Self::Simulated { rate_hz }
        } else {
            Self::Hidraw
        }
    }

    /// Build the transport for this source
    pub fn transport(&self, config: &DriverConfig) -> Result<Box<dyn Transport>> {
        match *self {
            Self::Hidraw => hidraw_transport(config),
            Self::Simulated { rate_hz } => {
                let interval = Duration::from_secs(1) / rate_hz.max(1);
                info!(rate_hz, "Using simulated headset");
                let transport = simulated_transport(SIMULATED_CALIBRATION.as_bytes())
                    .context("Failed to build simulated headset")?
                    .with_generator(SimulatedHeadset::new(0), interval);
                Ok(Box::new(transport))
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn hidraw_transport(config: &DriverConfig) -> Result<Box<dyn Transport>> {
    info!(device = %config.device.display(), "Using hidraw transport");
    Ok(Box::new(device::HidrawTransport::new(config.device.clone())))
}

#[cfg(not(target_os = "linux"))]
fn hidraw_transport(config: &DriverConfig) -> Result<Box<dyn Transport>> {
    anyhow::bail!(
        "hidraw transport for {} requires Linux, use --simulate",
        config.device.display()
    )
}
