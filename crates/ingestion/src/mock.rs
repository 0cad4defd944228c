//! Mock transport and simulated headset
//!
//! Used by tests and by the CLI's simulate mode, where no headset is attached.

use std::collections::{HashMap, VecDeque};
use std::f64::consts::TAU;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{PollStatus, RawSample, Transport, TransportError, IMU_SLOTS};
use tracing::trace;

use crate::report::encode_report;

/// One scripted readiness outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    /// Report becomes readable
    Report(Vec<u8>),
    /// Nothing arrives within the poll timeout
    Timeout,
    /// Hang-up condition (sticky)
    HangUp,
    /// Readiness wait fails
    PollError,
    /// Readiness succeeds but the read fails
    ReadError,
}

/// Behaviour once the script and generator are exhausted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Exhausted {
    /// Block for the full poll timeout, then time out
    #[default]
    Timeout,
    HangUp,
}

type ReportGenerator = Box<dyn Iterator<Item = Vec<u8>> + Send>;

#[derive(Default)]
struct MockState {
    open: bool,
    fail_open: bool,
    events: VecDeque<MockEvent>,
    pending: Option<Result<Vec<u8>, ()>>,
    generator: Option<(ReportGenerator, Duration)>,
    exhausted: Exhausted,
    features: HashMap<u8, VecDeque<Vec<u8>>>,
    sent_features: Vec<Vec<u8>>,
    fail_send_feature: Option<u8>,
}

enum PollAction {
    Ready,
    Wait(Duration, PollStatus),
    HangUp,
    Fail,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted in-memory transport
///
/// Readiness outcomes come from the event script first, then from the report
/// generator, then from the [`Exhausted`] fallback. Feature reads pop the
/// response queued for the requested report id; feature writes are recorded.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append scripted events
    pub fn with_events(self, events: impl IntoIterator<Item = MockEvent>) -> Self {
        lock(&self.state).events.extend(events);
        self
    }

    /// Queue a feature report response for `report_id`
    pub fn with_feature(self, report_id: u8, response: impl Into<Vec<u8>>) -> Self {
        lock(&self.state)
            .features
            .entry(report_id)
            .or_default()
            .push_back(response.into());
        self
    }

    /// Produce reports from `generator` every `interval` once the script runs out
    pub fn with_generator<G>(self, generator: G, interval: Duration) -> Self
    where
        G: Iterator<Item = Vec<u8>> + Send + 'static,
    {
        lock(&self.state).generator = Some((Box::new(generator), interval));
        self
    }

    pub fn when_exhausted(self, exhausted: Exhausted) -> Self {
        lock(&self.state).exhausted = exhausted;
        self
    }

    /// Make `open` fail
    pub fn fail_open(self) -> Self {
        lock(&self.state).fail_open = true;
        self
    }

    /// Make feature writes to `report_id` fail
    pub fn fail_send_feature(self, report_id: u8) -> Self {
        lock(&self.state).fail_send_feature = Some(report_id);
        self
    }

    /// Start in the open state
    pub fn opened(self) -> Self {
        lock(&self.state).open = true;
        self
    }

    /// Inspection handle that stays valid after the transport is moved away
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: self.state.clone(),
        }
    }

    fn next_action(&self, timeout: Duration) -> Result<PollAction, TransportError> {
        let mut state = lock(&self.state);
        if !state.open {
            return Err(TransportError::NotOpen);
        }

        if let Some(event) = state.events.pop_front() {
            return Ok(match event {
                MockEvent::Report(report) => {
                    state.pending = Some(Ok(report));
                    PollAction::Ready
                }
                MockEvent::ReadError => {
                    state.pending = Some(Err(()));
                    PollAction::Ready
                }
                MockEvent::Timeout => PollAction::Wait(timeout, PollStatus::Timeout),
                MockEvent::HangUp => {
                    state.events.push_front(MockEvent::HangUp);
                    PollAction::HangUp
                }
                MockEvent::PollError => PollAction::Fail,
            });
        }

        if let Some((generator, interval)) = state.generator.as_mut() {
            let interval = *interval;
            if let Some(report) = generator.next() {
                state.pending = Some(Ok(report));
                return Ok(PollAction::Wait(interval.min(timeout), PollStatus::Ready));
            }
            state.generator = None;
        }

        Ok(match state.exhausted {
            Exhausted::Timeout => PollAction::Wait(timeout, PollStatus::Timeout),
            Exhausted::HangUp => PollAction::HangUp,
        })
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        if state.fail_open {
            return Err(TransportError::open(
                "mock",
                io::Error::new(io::ErrorKind::NotFound, "no such device"),
            ));
        }
        state.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    fn poll_readable(&mut self, timeout: Duration) -> Result<PollStatus, TransportError> {
        match self.next_action(timeout)? {
            PollAction::Ready => Ok(PollStatus::Ready),
            PollAction::Wait(duration, status) => {
                std::thread::sleep(duration);
                Ok(status)
            }
            PollAction::HangUp => Ok(PollStatus::HangUp),
            PollAction::Fail => Err(TransportError::Poll(io::Error::new(
                io::ErrorKind::Interrupted,
                "scripted poll failure",
            ))),
        }
    }

    fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = lock(&self.state);
        if !state.open {
            return Err(TransportError::NotOpen);
        }

        match state.pending.take() {
            Some(Ok(report)) => {
                let len = report.len().min(buf.len());
                buf[..len].copy_from_slice(&report[..len]);
                Ok(len)
            }
            Some(Err(())) => Err(TransportError::Read(io::Error::other("scripted read failure"))),
            None => Err(TransportError::Read(io::Error::from(io::ErrorKind::WouldBlock))),
        }
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        let report_id = data.first().copied().unwrap_or_default();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        if state.fail_send_feature == Some(report_id) {
            return Err(TransportError::send_feature(
                report_id,
                io::Error::from(io::ErrorKind::BrokenPipe),
            ));
        }

        trace!(report_id, len = data.len(), "mock feature report sent");
        state.sent_features.push(data.to_vec());
        Ok(())
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = lock(&self.state);
        let report_id = buf.first().copied().unwrap_or_default();
        if !state.open {
            return Err(TransportError::NotOpen);
        }

        let response = state
            .features
            .get_mut(&report_id)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| {
                TransportError::get_feature(
                    report_id,
                    io::Error::new(io::ErrorKind::InvalidInput, "no response queued"),
                )
            })?;

        let len = response.len().min(buf.len());
        buf[..len].copy_from_slice(&response[..len]);
        Ok(len)
    }
}

/// Shared view into a [`MockTransport`]
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    /// Feature reports written so far, in order
    pub fn sent_features(&self) -> Vec<Vec<u8>> {
        lock(&self.state).sent_features.clone()
    }

    pub fn push_event(&self, event: MockEvent) {
        lock(&self.state).events.push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        lock(&self.state).events.len()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }
}

/// Round-robin triple buffer generator
///
/// Mimics the headset: every new sample overwrites the next slot in turn and
/// each report snapshots all three slots.
#[derive(Debug, Clone)]
pub struct SimulatedHeadset {
    slots: [RawSample; IMU_SLOTS],
    next_slot: usize,
    newest: u8,
    tick: u32,
    ticks_per_sample: u32,
    samples_per_report: u8,
}

impl SimulatedHeadset {
    /// Device ticks between samples
    pub const DEFAULT_TICKS_PER_SAMPLE: u32 = 48_000;

    /// Raw accelerometer reading for 1 g
    const ONE_G: f64 = 4096.0;

    /// Start so that the first report carries `first_seq` and the two after it
    pub fn new(first_seq: u8) -> Self {
        let mut headset = Self {
            slots: [RawSample::default(); IMU_SLOTS],
            next_slot: 0,
            newest: first_seq.wrapping_sub(1),
            tick: 0,
            ticks_per_sample: Self::DEFAULT_TICKS_PER_SAMPLE,
            samples_per_report: 1,
        };
        for _ in 0..IMU_SLOTS {
            headset.advance();
        }
        headset
    }

    /// New samples written between consecutive reports (1 to 3)
    pub fn samples_per_report(mut self, samples: u8) -> Self {
        self.samples_per_report = samples.clamp(1, IMU_SLOTS as u8);
        self
    }

    /// Sequence number of the newest slot
    pub fn newest(&self) -> u8 {
        self.newest
    }

    /// Current slot contents
    pub fn slots(&self) -> [RawSample; IMU_SLOTS] {
        self.slots
    }

    fn advance(&mut self) {
        self.newest = self.newest.wrapping_add(1);
        self.tick = self.tick.wrapping_add(self.ticks_per_sample);

        let phase = f64::from(self.tick / self.ticks_per_sample) / 500.0 * TAU;
        let wobble = (phase.sin() * 64.0) as i16;

        self.slots[self.next_slot] = RawSample {
            accel: [wobble, -wobble / 2, Self::ONE_G as i16],
            gyro: [wobble / 4, 0, -wobble / 4],
            time: self.tick,
            seq: self.newest,
        };
        self.next_slot = (self.next_slot + 1) % IMU_SLOTS;
    }

    /// Current wire report
    pub fn report(&self) -> Vec<u8> {
        encode_report(&self.slots).to_vec()
    }
}

impl Iterator for SimulatedHeadset {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        let report = self.report();
        for _ in 0..self.samples_per_report {
            self.advance();
        }
        Some(report)
    }
}
