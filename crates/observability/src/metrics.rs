//! Acquisition metrics collection
//!
//! Records per-sample metrics and aggregates the calibrated stream in memory
//! for end-of-run summaries.

use contracts::{CalibratedSample, DeviceState};
use metrics::{counter, gauge, histogram};

/// Record metrics for one calibrated sample
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_sample_metrics;
///
/// while let Ok(sample) = samples.recv().await {
///     record_sample_metrics(&sample);
/// }
/// ```
pub fn record_sample_metrics(sample: &CalibratedSample) {
    counter!("imu_samples_consumed_total").increment(1);

    gauge!("imu_last_consumed_sequence").set(f64::from(sample.seq));

    histogram!("imu_accel_magnitude").record(sample.accelerometer.norm());
    histogram!("imu_gyro_magnitude").record(sample.gyroscope.norm());
}

/// Record a device state transition
pub fn record_device_state(device: &str, state: DeviceState) {
    counter!(
        "imu_device_transitions_total",
        "device" => device.to_string(),
        "state" => state.as_str()
    )
    .increment(1);
}

/// Record consumer queue depth
pub fn record_queue_depth(device: &str, depth: usize) {
    gauge!(
        "imu_queue_depth",
        "device" => device.to_string()
    )
    .set(depth as f64);
}

/// Acquisition stream aggregator
///
/// Aggregates consumed samples in memory for statistics and summaries.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionStatsAggregator {
    /// Samples seen
    pub total_samples: u64,

    /// Sequence numbers missing between consecutive consumed samples
    pub sequence_gaps: u64,

    /// Device ticks between consecutive samples
    pub tick_delta_stats: RunningStats,

    /// Accelerometer magnitude
    pub accel_stats: RunningStats,

    /// Gyroscope magnitude
    pub gyro_stats: RunningStats,

    last: Option<(u8, u32)>,
}

impl AcquisitionStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update aggregate statistics
    pub fn update(&mut self, sample: &CalibratedSample) {
        self.total_samples += 1;

        if let Some((seq, time)) = self.last {
            self.sequence_gaps += u64::from(sample.seq.wrapping_sub(seq).wrapping_sub(1));
            self.tick_delta_stats
                .push(f64::from(sample.time.wrapping_sub(time)));
        }
        self.last = Some((sample.seq, sample.time));

        self.accel_stats.push(sample.accelerometer.norm());
        self.gyro_stats.push(sample.gyroscope.norm());
    }

    /// Build summary report
    pub fn summary(&self) -> AcquisitionSummary {
        let expected = self.total_samples + self.sequence_gaps;
        AcquisitionSummary {
            total_samples: self.total_samples,
            sequence_gaps: self.sequence_gaps,
            loss_rate: if expected > 0 {
                self.sequence_gaps as f64 / expected as f64 * 100.0
            } else {
                0.0
            },
            tick_delta: StatsSummary::from(&self.tick_delta_stats),
            accel_magnitude: StatsSummary::from(&self.accel_stats),
            gyro_magnitude: StatsSummary::from(&self.gyro_stats),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Acquisition summary
#[derive(Debug, Clone, Default)]
pub struct AcquisitionSummary {
    pub total_samples: u64,
    pub sequence_gaps: u64,
    pub loss_rate: f64,
    pub tick_delta: StatsSummary,
    pub accel_magnitude: StatsSummary,
    pub gyro_magnitude: StatsSummary,
}

impl std::fmt::Display for AcquisitionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== IMU Acquisition Summary ===")?;
        writeln!(f, "Total samples: {}", self.total_samples)?;
        writeln!(
            f,
            "Lost samples: {} ({:.2}%)",
            self.sequence_gaps, self.loss_rate
        )?;
        writeln!(f, "Tick delta: {}", self.tick_delta)?;
        writeln!(f, "Accel magnitude: {}", self.accel_magnitude)?;
        writeln!(f, "Gyro magnitude: {}", self.gyro_magnitude)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Vector3;

    fn sample(seq: u8, time: u32) -> CalibratedSample {
        CalibratedSample {
            accelerometer: Vector3::new(0.0, 0.0, 9.81),
            gyroscope: Vector3::new(0.3, 0.4, 0.0),
            time,
            seq,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = AcquisitionStatsAggregator::new();

        aggregator.update(&sample(254, u32::MAX - 999));
        aggregator.update(&sample(255, 0));
        aggregator.update(&sample(2, 3000));

        assert_eq!(aggregator.total_samples, 3);
        assert_eq!(aggregator.sequence_gaps, 2);
        assert_eq!(aggregator.tick_delta_stats.count(), 2);
        assert!((aggregator.tick_delta_stats.min() - 1000.0).abs() < 1e-10);
        assert!((aggregator.tick_delta_stats.max() - 3000.0).abs() < 1e-10);
        assert!((aggregator.gyro_stats.mean() - 0.5).abs() < 1e-10);

        let summary = aggregator.summary();
        assert!((summary.loss_rate - 40.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let summary = AcquisitionSummary {
            total_samples: 100,
            sequence_gaps: 5,
            loss_rate: 4.76,
            tick_delta: StatsSummary {
                count: 99,
                min: 47_000.0,
                max: 49_000.0,
                mean: 48_000.0,
                std_dev: 12.0,
            },
            ..AcquisitionSummary::default()
        };

        let output = format!("{}", summary);
        assert!(output.contains("Total samples: 100"));
        assert!(output.contains("4.76%"));
        assert!(output.contains("Gyro magnitude: N/A"));
    }
}
