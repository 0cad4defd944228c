//! Pipeline statistics and metrics.

use std::time::Duration;

use contracts::FirmwareVersion;
use ingestion::{LoopExit, MetricsSnapshot};
use observability::AcquisitionStatsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Samples taken off the channel by the consumer
    pub samples_consumed: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Firmware reported during startup
    pub firmware: Option<FirmwareVersion>,

    /// Why the acquisition loop exited, if it did
    pub exit: Option<LoopExit>,

    /// Stopped by a shutdown signal
    pub interrupted: bool,

    /// Counters from the acquisition worker
    pub acquisition: MetricsSnapshot,

    /// Consumed sample aggregator
    pub samples: AcquisitionStatsAggregator,
}

impl PipelineStats {
    /// Consumed samples per second
    pub fn rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.samples_consumed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of accepted samples dropped by backpressure, as percentage
    pub fn drop_rate(&self) -> f64 {
        let total = self.acquisition.samples_accepted;
        if total > 0 {
            (self.acquisition.samples_dropped as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  IMU Acquisition Statistics                  ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        if let Some(ref firmware) = self.firmware {
            println!("   ├─ Firmware: {}", firmware);
        }
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Samples consumed: {}", self.samples_consumed);
        println!("   ├─ Rate: {:.2} Hz", self.rate());
        match (self.interrupted, self.exit) {
            (true, _) => println!("   └─ Exit: interrupted"),
            (false, Some(LoopExit::HangUp)) => println!("   └─ Exit: device hung up"),
            (false, _) => println!("   └─ Exit: stopped"),
        }

        let acq = &self.acquisition;
        println!("\n📈 Acquisition Loop");
        println!("   ├─ Reports received: {}", acq.reports_received);
        println!("   ├─ Malformed reports: {}", acq.malformed_reports);
        println!("   ├─ Samples accepted: {}", acq.samples_accepted);
        println!("   ├─ Duplicate slots skipped: {}", acq.samples_stale);
        println!("   ├─ Sequence gaps: {}", acq.samples_lost);
        println!(
            "   ├─ Dropped (backpressure): {} ({:.2}%)",
            acq.samples_dropped,
            self.drop_rate()
        );
        println!("   ├─ Poll timeouts: {}", acq.poll_timeouts);
        println!(
            "   └─ I/O errors: {} poll, {} read",
            acq.poll_errors, acq.read_errors
        );

        println!("\n{}", self.samples.summary());
    }
}
