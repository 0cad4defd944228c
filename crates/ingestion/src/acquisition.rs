//! Acquisition loop
//!
//! One session per device, owned by the worker thread. The session holds the
//! sequence cursor, the shared calibration store and the reusable receive
//! buffer; nothing else touches them while the loop runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use config_loader::CalibrationStore;
use contracts::{
    PollStatus, ProtocolError, RawSample, TimeoutError, Transport, IMU_SLOTS, MAX_REPORT_LEN,
};
use sync_engine::{SequenceCursor, SequenceTracker};
use tracing::{debug, info, instrument, trace, warn};

use crate::config::AcquisitionMetrics;
use crate::decoder::decode;
use crate::report::parse_report;
use crate::sink::{SampleSink, SendOutcome};

/// Acquisition loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// What a single loop iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Active flag was cleared
    Stopped,
    /// A valid report was processed; count of new samples emitted
    Samples(usize),
    /// No report within the poll timeout
    Timeout,
    /// Readiness wait failed; retried next iteration
    PollFailed,
    /// Read failed; retried next iteration
    ReadFailed,
    /// Report discarded
    Malformed(ProtocolError),
    /// Device hang-up or error condition
    HangUp,
}

impl IterationOutcome {
    /// Whether the loop must exit after this outcome
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::HangUp)
    }
}

/// Why the loop exited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Stop was requested
    Stopped,
    /// Device went away
    HangUp,
}

/// Per-device acquisition session
pub struct AcquisitionSession {
    device: String,
    calibration: Arc<CalibrationStore>,
    tracker: SequenceTracker,
    sink: SampleSink,
    metrics: Arc<AcquisitionMetrics>,
    poll_timeout: Duration,
    buffer: [u8; MAX_REPORT_LEN],
    state: LoopState,
}

impl AcquisitionSession {
    pub fn new(
        device: impl Into<String>,
        calibration: Arc<CalibrationStore>,
        sink: SampleSink,
        metrics: Arc<AcquisitionMetrics>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            device: device.into(),
            calibration,
            tracker: SequenceTracker::new(),
            sink,
            metrics,
            poll_timeout,
            buffer: [0; MAX_REPORT_LEN],
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn cursor(&self) -> SequenceCursor {
        self.tracker.cursor()
    }

    pub fn calibration(&self) -> &CalibrationStore {
        &self.calibration
    }

    pub fn metrics(&self) -> &Arc<AcquisitionMetrics> {
        &self.metrics
    }

    /// Run until the active flag is cleared or the device hangs up
    #[instrument(
        name = "acquisition_loop",
        skip_all,
        fields(device = %self.device, poll_timeout_ms = self.poll_timeout.as_millis() as u64)
    )]
    pub fn run<T: Transport + ?Sized>(&mut self, transport: &mut T, active: &AtomicBool) -> LoopExit {
        self.state = LoopState::Running;
        info!("acquisition loop started");

        let exit = loop {
            match self.run_iteration(transport, active) {
                IterationOutcome::Stopped => break LoopExit::Stopped,
                IterationOutcome::HangUp => break LoopExit::HangUp,
                _ => {}
            }
        };

        self.state = LoopState::Stopped;
        let stats = self.tracker.stats();
        info!(
            exit = ?exit,
            cursor = %self.tracker.cursor(),
            reports = stats.reports,
            accepted = stats.accepted,
            lost = stats.lost,
            "acquisition loop stopped"
        );
        exit
    }

    /// One bounded wait, at most one report
    pub fn run_iteration<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        active: &AtomicBool,
    ) -> IterationOutcome {
        if !active.load(Ordering::Acquire) {
            self.state = LoopState::Stopped;
            return IterationOutcome::Stopped;
        }

        match transport.poll_readable(self.poll_timeout) {
            Ok(PollStatus::Ready) => {}
            Ok(PollStatus::Timeout) => {
                self.metrics.record_poll_timeout();
                let error = TimeoutError {
                    waited: self.poll_timeout,
                };
                debug!(device = %self.device, error = %error, "no report");
                return IterationOutcome::Timeout;
            }
            Ok(PollStatus::HangUp) => {
                warn!(device = %self.device, "device hung up");
                self.state = LoopState::Stopped;
                return IterationOutcome::HangUp;
            }
            Err(e) if e.is_fatal() => {
                warn!(device = %self.device, error = %e, "poll failed, stopping");
                self.state = LoopState::Stopped;
                return IterationOutcome::HangUp;
            }
            Err(e) => {
                self.metrics.record_poll_error();
                warn!(device = %self.device, error = %e, "poll failed");
                return IterationOutcome::PollFailed;
            }
        }

        let len = match transport.read_report(&mut self.buffer) {
            Ok(len) => len,
            Err(e) if e.is_fatal() => {
                warn!(device = %self.device, error = %e, "read failed, stopping");
                self.state = LoopState::Stopped;
                return IterationOutcome::HangUp;
            }
            Err(e) => {
                self.metrics.record_read_error();
                warn!(device = %self.device, error = %e, "read failed");
                return IterationOutcome::ReadFailed;
            }
        };
        self.metrics.record_report();

        match parse_report(&self.buffer[..len.min(MAX_REPORT_LEN)]) {
            Ok(samples) => IterationOutcome::Samples(self.accept(&samples)),
            Err(e) => {
                self.metrics.record_malformed();
                warn!(device = %self.device, error = %e, "discarding report");
                IterationOutcome::Malformed(e)
            }
        }
    }

    /// Validate, resolve, decode and emit one report
    ///
    /// Malformed input leaves the cursor untouched.
    pub fn process_report(&mut self, report: &[u8]) -> Result<usize, ProtocolError> {
        let samples = parse_report(report)?;
        Ok(self.accept(&samples))
    }

    fn accept(&mut self, samples: &[RawSample; IMU_SLOTS]) -> usize {
        let resolution = self.tracker.push(samples);
        self.metrics
            .record_resolution(resolution.len(), resolution.stale, resolution.lost);

        if resolution.lost > 0 {
            debug!(device = %self.device, lost = resolution.lost, "sequence gap");
        }

        for raw in &resolution {
            let sample = decode(raw, &self.calibration);
            trace!(
                device = %self.device,
                seq = sample.seq,
                time = sample.time,
                "sample decoded"
            );
            if self.sink.send(sample, &self.metrics, &self.device) == SendOutcome::Closed {
                trace!(device = %self.device, seq = sample.seq, "no consumer");
            }
        }

        resolution.len()
    }
}
