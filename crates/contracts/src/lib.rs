//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: sample
//! types, report layouts, the transport and device traits, configuration and
//! the error taxonomy. Business crates depend on this crate, never the reverse.
//!
//! ## Time Model
//! - Samples carry the device's 32-bit tick count unconverted
//! - `seq` is the device's rolling 8-bit sequence number, used for ordering

mod device;
mod driver_config;
mod error;
mod report;
mod sample;
mod transport;

pub use device::{Device, DeviceState, DeviceType};
pub use driver_config::{AcquisitionConfig, DriverConfig, DropPolicy};
pub use error::*;
pub use report::*;
pub use sample::{CalibratedSample, RawSample, Vector3};
pub use transport::{PollStatus, Transport};
