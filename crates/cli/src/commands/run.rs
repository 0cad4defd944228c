//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::DriverConfig;
use std::time::Duration;
use tracing::{info, warn};

use super::load_driver_config;
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig, SampleSource};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let mut config = load_driver_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    ConfigLoader::validate(&config).map_err(CliError::from)?;

    info!(
        device = %config.device.display(),
        name = %config.name,
        poll_timeout_ms = config.acquisition.poll_timeout_ms,
        channel_capacity = config.acquisition.channel_capacity,
        drop_policy = ?config.acquisition.drop_policy,
        "Configuration loaded"
    );

    let pipeline_config = PipelineConfig {
        driver: config,
        source: SampleSource::from_flags(args.simulate, args.simulate_hz),
        max_samples: if args.max_samples == 0 {
            None
        } else {
            Some(args.max_samples)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);

    info!("Starting pipeline...");

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        samples = stats.samples_consumed,
        dropped = stats.acquisition.samples_dropped,
        duration_secs = stats.duration.as_secs_f64(),
        rate_hz = format!("{:.2}", stats.rate()),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("vive-imu finished");
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(config: &mut DriverConfig, args: &RunArgs) {
    if let Some(ref device) = args.device {
        info!(device = %device.display(), "Overriding device from CLI");
        config.device = device.clone();
    }
    if let Some(ref calibration) = args.calibration {
        info!(path = %calibration.display(), "Overriding calibration from CLI");
        config.calibration_override = Some(calibration.clone());
    }
    if let Some(poll_timeout_ms) = args.poll_timeout_ms {
        config.acquisition.poll_timeout_ms = poll_timeout_ms;
    }
    if let Some(buffer_size) = args.buffer_size {
        config.acquisition.channel_capacity = buffer_size;
    }
    if let Some(drop_policy) = args.drop_policy {
        config.acquisition.drop_policy = drop_policy.into();
    }
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
