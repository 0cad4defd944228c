//! Pipeline orchestrator - drives one headset from startup to shutdown.
//!
//! The driver's blocking calls (`start` talks to the device, `stop` joins the
//! worker thread) run on the blocking pool; calibrated samples are consumed
//! on the async side.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{Device, DeviceState, DriverConfig, DriverResult, Transport};
use device::HeadsetImu;
use ingestion::LoopExit;
use observability::{record_device_state, record_queue_depth, record_sample_metrics};
use tracing::{debug, info, warn};

use super::{PipelineStats, SampleSource};
use crate::error::CliError;

/// Queue depth is sampled once per this many consumed samples
const QUEUE_DEPTH_INTERVAL: u64 = 100;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Driver configuration after CLI overrides
    pub driver: DriverConfig,

    /// Report source
    pub source: SampleSource,

    /// Maximum number of samples to consume (None = unlimited)
    pub max_samples: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the sample limit, the timeout, `shutdown`, or the device going away
    pub async fn run<S>(self, shutdown: S) -> Result<PipelineStats>
    where
        S: Future<Output = ()>,
    {
        let start_time = Instant::now();

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let transport = self.config.source.transport(&self.config.driver)?;
        let mut driver = HeadsetImu::new(self.config.driver.clone(), transport);
        let samples = driver
            .take_receiver()
            .context("Failed to get sample receiver")?;
        let name = driver.name().to_string();

        info!(device = %name, "Starting headset...");
        let driver = start_driver(driver).await?;
        record_device_state(&name, driver.state());

        let mut stats = PipelineStats {
            firmware: driver.firmware().cloned(),
            ..Default::default()
        };
        let metrics = driver.metrics();

        info!(max_samples = ?self.config.max_samples, "Acquisition running");

        let deadline = self.config.timeout.map(|t| tokio::time::Instant::now() + t);
        let timeout = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(timeout);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                sample = samples.recv() => {
                    let Ok(sample) = sample else {
                        info!("Sample stream closed");
                        break;
                    };

                    record_sample_metrics(&sample);
                    stats.samples.update(&sample);
                    stats.samples_consumed += 1;

                    debug!(
                        seq = sample.seq,
                        time = sample.time,
                        accel = ?sample.accelerometer,
                        gyro = ?sample.gyroscope,
                        "Sample consumed"
                    );

                    if stats.samples_consumed % QUEUE_DEPTH_INTERVAL == 0 {
                        record_queue_depth(&name, samples.len());
                    }

                    if let Some(max) = self.config.max_samples {
                        if stats.samples_consumed >= max {
                            info!(samples = stats.samples_consumed, "Reached max samples limit");
                            break;
                        }
                    }
                }
                _ = &mut timeout => {
                    if let Some(timeout) = self.config.timeout {
                        warn!(timeout_secs = timeout.as_secs(), "Pipeline timed out");
                    }
                    break;
                }
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping headset...");
                    stats.interrupted = true;
                    break;
                }
            }
        }

        // Shutdown
        info!("Shutting down pipeline...");
        let (state, exit) = stop_driver(driver).await?;
        record_device_state(&name, state);

        stats.exit = exit;
        stats.acquisition = metrics.snapshot();
        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            rate_hz = format!("{:.2}", stats.rate()),
            exit = ?stats.exit,
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

type Driver = HeadsetImu<Box<dyn Transport>>;

/// Run startup and spawn the acquisition worker
async fn start_driver(mut driver: Driver) -> Result<Driver> {
    let name = driver.name().to_string();
    let started = tokio::task::spawn_blocking(move || -> DriverResult<Driver> {
        driver.start()?;
        driver.run()?;
        Ok(driver)
    })
    .await
    .context("Startup task panicked")?;

    started.map_err(|e| CliError::startup(name, e).into())
}

/// Stop the acquisition worker and join it
async fn stop_driver(mut driver: Driver) -> Result<(DeviceState, Option<LoopExit>)> {
    let stopped = tokio::task::spawn_blocking(move || {
        driver
            .stop()
            .map(|_| (driver.state(), driver.exit_reason()))
    })
    .await
    .context("Stop task panicked")?;

    stopped.map_err(|e| CliError::shutdown(e.to_string()).into())
}
