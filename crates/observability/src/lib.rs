//! # Observability
//!
//! Tracing initialization and Prometheus metrics.
//!
//! ## Features
//!
//! - Tracing setup (JSON/Pretty/Compact), written to stderr
//! - Prometheus exporter
//! - Calibrated sample stream statistics
//!
//! ## Example
//!
//! ```ignore
//! use observability::{init_with_config, AcquisitionStatsAggregator, ObservabilityConfig};
//!
//! init_with_config(ObservabilityConfig::default())?;
//!
//! let mut stats = AcquisitionStatsAggregator::new();
//! while let Ok(sample) = samples.recv().await {
//!     observability::record_sample_metrics(&sample);
//!     stats.update(&sample);
//! }
//! println!("{}", stats.summary());
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_device_state, record_queue_depth, record_sample_metrics, AcquisitionStatsAggregator,
    AcquisitionSummary, RunningStats, StatsSummary,
};

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log output format
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Default log level when RUST_LOG is unset
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Log level for a `-v` count, `warn` when quiet
    pub fn level_for(verbose: u8, quiet: bool) -> &'static str {
        match (quiet, verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON
    Json,
    /// Human readable, multi-line
    #[default]
    Pretty,
    /// Single line
    Compact,
}

/// Initialize tracing, and the Prometheus exporter when a port is set
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    // worker threads are named per device, so thread names go into every format
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_thread_names(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_thread_names(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// Install only the Prometheus recorder
///
/// For processes where tracing is set up elsewhere, or where the port is only
/// known once a command has parsed its arguments.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
