//! Vive headset IMU driver
//!
//! `start` runs the startup sequence against the transport, `run` moves the
//! transport and the calibration store into a dedicated worker thread that
//! owns the acquisition session, `stop` clears the active flag and joins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use async_channel::Receiver;
use config_loader::CalibrationStore;
use contracts::{
    CalibratedSample, Device, DeviceState, DeviceType, DriverConfig, DriverError, DriverResult,
    FirmwareVersion, Transport,
};
use ingestion::{AcquisitionMetrics, AcquisitionSession, BackpressureConfig, LoopExit, SampleSink};
use tracing::{debug, info, warn};

use crate::startup::{run_startup, StartupReport};

/// Headset IMU driver over any [`Transport`]
pub struct HeadsetImu<T: Transport + 'static> {
    config: DriverConfig,
    state: DeviceState,
    transport: Option<T>,
    active: Arc<AtomicBool>,
    worker: Option<JoinHandle<LoopExit>>,
    exit: Option<LoopExit>,
    metrics: Arc<AcquisitionMetrics>,
    sink: Option<SampleSink>,
    receiver: Option<Receiver<CalibratedSample>>,
    startup: Option<StartupReport>,
}

impl<T: Transport + 'static> HeadsetImu<T> {
    pub fn new(config: DriverConfig, transport: T) -> Self {
        let backpressure = BackpressureConfig::from(&config.acquisition);
        let (sink, receiver) = SampleSink::bounded(&backpressure);

        Self {
            config,
            state: DeviceState::Idle,
            transport: Some(transport),
            active: Arc::new(AtomicBool::new(false)),
            worker: None,
            exit: None,
            metrics: Arc::new(AcquisitionMetrics::new()),
            sink: Some(sink),
            receiver: Some(receiver),
            startup: None,
        }
    }

    /// Take the calibrated sample stream (only once)
    pub fn take_receiver(&mut self) -> Option<Receiver<CalibratedSample>> {
        self.receiver.take()
    }

    pub fn metrics(&self) -> Arc<AcquisitionMetrics> {
        self.metrics.clone()
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Firmware version read during startup
    pub fn firmware(&self) -> Option<&FirmwareVersion> {
        self.startup.as_ref().map(|s| &s.firmware)
    }

    /// Calibration loaded during startup
    pub fn calibration(&self) -> Option<&CalibrationStore> {
        self.startup.as_ref().map(|s| &s.calibration)
    }

    /// Why the acquisition loop exited, once it has
    pub fn exit_reason(&self) -> Option<LoopExit> {
        self.exit
    }

    /// Whether the worker thread is still acquiring
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn join_worker(&mut self) -> DriverResult<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        let exit = worker
            .join()
            .map_err(|_| DriverError::worker("acquisition worker panicked"))?;
        debug!(device = %self.config.name, exit = ?exit, "acquisition worker joined");
        self.exit = Some(exit);
        Ok(())
    }
}

impl<T: Transport + 'static> Device for HeadsetImu<T> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn device_type(&self) -> DeviceType {
        DeviceType::Hmd
    }

    fn state(&self) -> DeviceState {
        match self.state {
            DeviceState::Running if !self.is_running() => DeviceState::Stopped,
            state => state,
        }
    }

    fn start(&mut self) -> DriverResult<()> {
        match self.state {
            DeviceState::Idle => {}
            DeviceState::Stopped => {
                return Err(DriverError::invalid_state("cannot restart a stopped device"))
            }
            state => {
                return Err(DriverError::invalid_state(format!(
                    "device already started ({state:?})"
                )))
            }
        }

        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| DriverError::invalid_state("transport already released"))?;

        let report = run_startup(
            transport,
            &self.config.name,
            self.config.calibration_override.as_deref(),
        )?;

        self.startup = Some(report);
        self.state = DeviceState::Started;
        Ok(())
    }

    fn run(&mut self) -> DriverResult<()> {
        if self.state != DeviceState::Started {
            return Err(DriverError::invalid_state(format!(
                "run requires a started device, state is {:?}",
                self.state
            )));
        }

        let calibration = self
            .startup
            .as_ref()
            .map(|s| Arc::new(s.calibration))
            .ok_or_else(|| DriverError::invalid_state("calibration not loaded"))?;
        let (Some(mut transport), Some(sink)) = (self.transport.take(), self.sink.take()) else {
            return Err(DriverError::invalid_state("acquisition already spawned"));
        };

        let mut session = AcquisitionSession::new(
            self.config.name.clone(),
            calibration,
            sink,
            self.metrics.clone(),
            self.config.acquisition.poll_timeout(),
        );

        self.active.store(true, Ordering::Release);
        let active = self.active.clone();

        let worker = std::thread::Builder::new()
            .name(format!("imu-{}", self.config.name))
            .spawn(move || session.run(&mut transport, &active))
            .map_err(|e| {
                self.active.store(false, Ordering::Release);
                DriverError::worker(format!("failed to spawn acquisition worker: {e}"))
            })?;

        info!(device = %self.config.name, "acquisition worker spawned");
        self.worker = Some(worker);
        self.state = DeviceState::Running;
        Ok(())
    }

    fn stop(&mut self) -> DriverResult<()> {
        if self.state == DeviceState::Stopped {
            return Ok(());
        }

        if self.active.swap(false, Ordering::AcqRel) {
            debug!(device = %self.config.name, "stopping acquisition");
        }

        let joined = self.join_worker();
        self.transport = None;
        self.sink = None;
        self.state = DeviceState::Stopped;
        info!(device = %self.config.name, "device stopped");
        joined
    }
}

impl<T: Transport + 'static> Drop for HeadsetImu<T> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(device = %self.config.name, error = %e, "stop on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{simulated_transport, SIMULATED_CALIBRATION};
    use ingestion::{Exhausted, MockTransport, SimulatedHeadset};
    use std::time::{Duration, Instant};

    fn config() -> DriverConfig {
        DriverConfig {
            name: "test-hmd".to_string(),
            acquisition: contracts::AcquisitionConfig {
                poll_timeout_ms: 20,
                ..Default::default()
            },
            ..DriverConfig::default()
        }
    }

    fn simulated() -> MockTransport {
        simulated_transport(SIMULATED_CALIBRATION.as_bytes()).unwrap()
    }

    #[test]
    fn test_lifecycle() {
        let transport = simulated()
            .with_generator(SimulatedHeadset::new(0).take(5), Duration::ZERO)
            .when_exhausted(Exhausted::HangUp);
        let mut driver = HeadsetImu::new(config(), transport);
        let rx = driver.take_receiver().unwrap();
        assert!(driver.take_receiver().is_none());

        assert_eq!(driver.state(), DeviceState::Idle);
        driver.start().unwrap();
        assert_eq!(driver.state(), DeviceState::Started);
        assert_eq!(driver.firmware().unwrap().string1, "simulated");

        driver.run().unwrap();
        driver.stop().unwrap();
        assert_eq!(driver.state(), DeviceState::Stopped);

        let seqs: Vec<u8> = std::iter::from_fn(|| rx.try_recv().ok()).map(|s| s.seq).collect();
        assert!(seqs.windows(2).all(|w| w[1] == w[0].wrapping_add(1)));
    }

    #[test]
    fn test_hangup_ends_worker() {
        let transport = simulated()
            .with_generator(SimulatedHeadset::new(10).take(3), Duration::ZERO)
            .when_exhausted(Exhausted::HangUp);
        let mut driver = HeadsetImu::new(config(), transport);
        let rx = driver.take_receiver().unwrap();
        driver.start().unwrap();
        driver.run().unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while driver.is_running() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(driver.state(), DeviceState::Stopped);

        driver.stop().unwrap();
        assert_eq!(driver.exit_reason(), Some(LoopExit::HangUp));
        assert_eq!(rx.len(), 5);
    }

    #[test]
    fn test_stop_is_idempotent_and_final() {
        let mut driver = HeadsetImu::new(config(), simulated());
        driver.start().unwrap();
        driver.run().unwrap();

        driver.stop().unwrap();
        driver.stop().unwrap();
        assert_eq!(driver.exit_reason(), Some(LoopExit::Stopped));

        assert!(matches!(driver.start(), Err(DriverError::InvalidState { .. })));
        assert!(matches!(driver.run(), Err(DriverError::InvalidState { .. })));
    }

    #[test]
    fn test_failed_start_stays_idle() {
        let blob = br#"{"acc_bias":[0,0,0],"acc_scale":[1,1,1],"gyro_bias":[0,0,0]}"#;
        let mut driver = HeadsetImu::new(config(), simulated_transport(blob).unwrap());

        assert!(driver.start().is_err());
        assert_eq!(driver.state(), DeviceState::Idle);
        assert!(matches!(driver.run(), Err(DriverError::InvalidState { .. })));
        assert!(!driver.is_running());
    }

    #[test]
    fn test_run_before_start() {
        let mut driver = HeadsetImu::new(config(), simulated());
        assert!(matches!(driver.run(), Err(DriverError::InvalidState { .. })));
    }

    #[test]
    fn test_double_start_rejected() {
        let mut driver = HeadsetImu::new(config(), simulated());
        driver.start().unwrap();
        assert!(matches!(driver.start(), Err(DriverError::InvalidState { .. })));
    }
}
