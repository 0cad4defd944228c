//! Device capability interface
//!
//! Drivers plug into an external device registry through this trait instead
//! of a class hierarchy. `start` runs the startup sequence, `run` spawns the
//! acquisition worker, `stop` cancels it.

use serde::{Deserialize, Serialize};

use crate::DriverResult;

/// Device lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    /// Constructed, startup not yet completed
    #[default]
    Idle,
    /// Startup completed; acquisition may run
    Started,
    /// Acquisition loop active
    Running,
    /// Terminal; no further I/O
    Stopped,
}

impl DeviceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Started => "started",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

/// Device kind, used for registry bookkeeping and log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Hmd,
    Controller,
    Tracker,
}

/// Device capability trait
pub trait Device: Send {
    /// Human readable device name (log field)
    fn name(&self) -> &str;

    /// Device kind
    fn device_type(&self) -> DeviceType;

    /// Current lifecycle state
    fn state(&self) -> DeviceState;

    /// Run the startup sequence; fails fast without partial start
    fn start(&mut self) -> DriverResult<()>;

    /// Spawn the acquisition loop on its own worker
    fn run(&mut self) -> DriverResult<()>;

    /// Signal the acquisition loop to stop and wait for it
    ///
    /// Idempotent: stopping a stopped device is a no-op.
    fn stop(&mut self) -> DriverResult<()>;
}
