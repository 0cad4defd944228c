//! Transport trait - HID device I/O abstraction
//!
//! Decouples the startup sequence and the acquisition loop from the concrete
//! device node. The Linux hidraw implementation and the scripted mock used in
//! tests both implement this trait.

use std::time::Duration;

use crate::TransportError;

/// Outcome of a bounded readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// A periodic report can be read without blocking
    Ready,
    /// Nothing arrived within the timeout
    Timeout,
    /// Hang-up or error condition; no further reports will arrive
    HangUp,
}

/// HID transport
///
/// One transport belongs to exactly one driver instance. It is moved into the
/// acquisition worker once startup completes, so implementations must be `Send`.
pub trait Transport: Send {
    /// Open the device (no-op if already open)
    fn open(&mut self) -> Result<(), TransportError>;

    /// Check if the device is open
    fn is_open(&self) -> bool;

    /// Wait for a periodic report, up to `timeout`
    fn poll_readable(&mut self, timeout: Duration) -> Result<PollStatus, TransportError>;

    /// Read one periodic report into `buf`, returning its length
    fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Send a feature report; `data[0]` is the report id
    fn send_feature_report(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Get a feature report; `buf[0]` must hold the report id on entry
    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<(), TransportError> {
        (**self).open()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn poll_readable(&mut self, timeout: Duration) -> Result<PollStatus, TransportError> {
        (**self).poll_readable(timeout)
    }

    fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).read_report(buf)
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).send_feature_report(data)
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).get_feature_report(buf)
    }
}
