//! # Ingestion Pipeline
//!
//! Headset IMU report ingestion.
//!
//! Responsibilities:
//! - Validate periodic reports and copy the three sample slots out
//! - Resolve new samples against the session cursor
//! - Apply calibration and emit `CalibratedSample`s
//! - Backpressure management and drop policy
//! - Send to downstream via async-channel
//!
//! ## Usage Example
//!
//! ```
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use config_loader::CalibrationStore;
//! use ingestion::{
//!     AcquisitionMetrics, AcquisitionSession, BackpressureConfig, Exhausted, LoopExit,
//!     MockTransport, SampleSink, SimulatedHeadset,
//! };
//!
//! let (sink, rx) = SampleSink::bounded(&BackpressureConfig::default());
//! let mut session = AcquisitionSession::new(
//!     "hmd",
//!     Arc::new(CalibrationStore::identity()),
//!     sink,
//!     Arc::new(AcquisitionMetrics::new()),
//!     Duration::from_millis(10),
//! );
//!
//! let mut transport = MockTransport::new()
//!     .with_generator(SimulatedHeadset::new(0).take(4), Duration::ZERO)
//!     .when_exhausted(Exhausted::HangUp)
//!     .opened();
//!
//! let exit = session.run(&mut transport, &AtomicBool::new(true));
//! assert_eq!(exit, LoopExit::HangUp);
//! assert_eq!(rx.len(), 6);
//! ```

mod acquisition;
mod config;
mod decoder;
mod mock;
mod report;
mod sink;

// Re-exports
pub use acquisition::{AcquisitionSession, IterationOutcome, LoopExit, LoopState};
pub use config::{AcquisitionMetrics, BackpressureConfig, DropPolicy, MetricsSnapshot};
pub use contracts::CalibratedSample;
pub use decoder::decode;
pub use mock::{Exhausted, MockEvent, MockHandle, MockTransport, SimulatedHeadset};
pub use report::{encode_report, parse_report};
pub use sink::{SampleSink, SendOutcome};
