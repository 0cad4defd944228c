//! Layered error definitions
//!
//! Categorized by source: transport / config / protocol / timeout.
//! `DriverError` unifies them for the startup path.

use std::time::Duration;

use thiserror::Error;

/// Device transport error (open / read / write / poll)
#[derive(Debug, Error)]
pub enum TransportError {
    /// Device node could not be opened
    #[error("failed to open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Operation attempted before the transport was opened
    #[error("transport is not open")]
    NotOpen,

    /// Readiness wait failed (distinct from a timeout)
    #[error("poll failure: {0}")]
    Poll(#[source] std::io::Error),

    /// Periodic report read failed
    #[error("read error: {0}")]
    Read(#[source] std::io::Error),

    /// Feature report write failed
    #[error("failed to send feature report 0x{report_id:02x}: {source}")]
    SendFeature {
        report_id: u8,
        #[source]
        source: std::io::Error,
    },

    /// Feature report read failed
    #[error("failed to get feature report 0x{report_id:02x}: {source}")]
    GetFeature {
        report_id: u8,
        #[source]
        source: std::io::Error,
    },

    /// Feature report came back shorter than its fixed layout
    #[error("short feature report 0x{report_id:02x}: expected {expected} bytes, got {actual}")]
    ShortFeature {
        report_id: u8,
        expected: usize,
        actual: usize,
    },

    /// Device configuration download exceeded its bound
    #[error("device configuration exceeds {max} bytes")]
    ConfigTooLarge { max: usize },

    /// Device configuration could not be inflated
    #[error("device configuration inflate error: {0}")]
    Inflate(#[source] std::io::Error),

    /// Device hung up or reported an error condition
    #[error("device hung up")]
    HangUp,
}

impl TransportError {
    /// Create open error
    pub fn open(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Create feature report write error
    pub fn send_feature(report_id: u8, source: std::io::Error) -> Self {
        Self::SendFeature { report_id, source }
    }

    /// Create feature report read error
    pub fn get_feature(report_id: u8, source: std::io::Error) -> Self {
        Self::GetFeature { report_id, source }
    }

    /// Whether the loop must stop on this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::HangUp | Self::NotOpen)
    }
}

/// Calibration blob or driver configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Blob is not a decodable structured document
    #[error("malformed configuration: {message}")]
    Malformed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Required field absent or not a 3-element numeric array
    #[error("missing or invalid field '{field}'")]
    MissingField { field: String },

    /// Driver configuration validation error
    #[error("config validation error at '{field}': {message}")]
    Validation { field: String, message: String },

    /// IO error while reading a configuration file
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create malformed-document error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Create missing-field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Malformed periodic report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Wrong byte length
    #[error("invalid {actual}-byte report (expected {expected})")]
    InvalidLength { actual: usize, expected: usize },

    /// Wrong leading type tag
    #[error("unexpected report id 0x{actual:02x} (expected 0x{expected:02x})")]
    UnexpectedReportId { actual: u8, expected: u8 },
}

/// No readiness within the poll window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("poll timeout after {}ms", .waited.as_millis())]
pub struct TimeoutError {
    pub waited: Duration,
}

/// Unified driver error
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// Lifecycle misuse (start twice, start after stop, ...)
    #[error("invalid device state: {message}")]
    InvalidState { message: String },

    /// Worker thread could not be spawned or joined
    #[error("acquisition worker error: {message}")]
    Worker { message: String },
}

impl DriverError {
    /// Create lifecycle error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create worker error
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }
}

/// Result alias for driver operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;
