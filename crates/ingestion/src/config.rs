//! Backpressure configuration and acquisition metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::AcquisitionConfig;
pub use contracts::DropPolicy;
use serde::Serialize;

/// Backpressure configuration
#[derive(Debug, Clone)]
pub struct BackpressureConfig {
    /// Channel capacity
    pub channel_capacity: usize,

    /// Drop policy when full
    pub drop_policy: DropPolicy,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self::from(&AcquisitionConfig::default())
    }
}

impl BackpressureConfig {
    /// Create new backpressure configuration
    pub fn new(channel_capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            channel_capacity,
            drop_policy,
        }
    }
}

impl From<&AcquisitionConfig> for BackpressureConfig {
    fn from(config: &AcquisitionConfig) -> Self {
        Self::new(config.channel_capacity, config.drop_policy)
    }
}

/// Acquisition metrics
///
/// Shared between the worker thread and whoever owns the driver; every
/// counter is a relaxed atomic.
#[derive(Debug, Default)]
pub struct AcquisitionMetrics {
    /// Periodic reports read
    pub reports_received: AtomicU64,

    /// Reports discarded for bad length or report id
    pub malformed_reports: AtomicU64,

    /// New samples accepted by the resolver
    pub samples_accepted: AtomicU64,

    /// Slots skipped as already delivered
    pub samples_stale: AtomicU64,

    /// Sequence numbers never seen
    pub samples_lost: AtomicU64,

    /// Calibrated samples dropped by backpressure
    pub samples_dropped: AtomicU64,

    /// Readiness waits that timed out
    pub poll_timeouts: AtomicU64,

    /// Readiness waits that failed
    pub poll_errors: AtomicU64,

    /// Reads that failed
    pub read_errors: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl AcquisitionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_report(&self) {
        self.reports_received.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("imu_reports_total").increment(1);
    }

    pub fn record_malformed(&self) {
        self.malformed_reports.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("imu_reports_malformed_total").increment(1);
    }

    /// Record the outcome of resolving one report
    pub fn record_resolution(&self, accepted: usize, stale: usize, lost: u32) {
        self.samples_accepted
            .fetch_add(accepted as u64, Ordering::Relaxed);
        self.samples_stale.fetch_add(stale as u64, Ordering::Relaxed);
        self.samples_lost
            .fetch_add(u64::from(lost), Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.samples_dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("imu_samples_dropped_total").increment(1);
    }

    pub fn record_poll_timeout(&self) {
        self.poll_timeouts.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("imu_poll_timeouts_total").increment(1);
    }

    pub fn record_poll_error(&self) {
        self.poll_errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("imu_io_errors_total", "op" => "poll").increment(1);
    }

    pub fn record_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("imu_io_errors_total", "op" => "read").increment(1);
    }

    /// Update queue length
    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reports_received: self.reports_received.load(Ordering::Relaxed),
            malformed_reports: self.malformed_reports.load(Ordering::Relaxed),
            samples_accepted: self.samples_accepted.load(Ordering::Relaxed),
            samples_stale: self.samples_stale.load(Ordering::Relaxed),
            samples_lost: self.samples_lost.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            poll_timeouts: self.poll_timeouts.load(Ordering::Relaxed),
            poll_errors: self.poll_errors.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub reports_received: u64,
    pub malformed_reports: u64,
    pub samples_accepted: u64,
    pub samples_stale: u64,
    pub samples_lost: u64,
    pub samples_dropped: u64,
    pub poll_timeouts: u64,
    pub poll_errors: u64,
    pub read_errors: u64,
    pub queue_len: usize,
}
