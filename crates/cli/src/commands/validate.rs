//! `validate` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use config_loader::{CalibrationStore, ConfigLoader, MAX_POLL_TIMEOUT_MS};
use contracts::{DriverConfig, DropPolicy, Vector3};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<FileResult<ConfigSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    calibration: Option<FileResult<CalibrationSummary>>,
}

#[derive(Serialize)]
struct FileResult<T> {
    valid: bool,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<T>,
}

impl<T> FileResult<T> {
    fn invalid(path: &Path, error: impl ToString) -> Self {
        Self {
            valid: false,
            path: path.display().to_string(),
            error: Some(error.to_string()),
            warnings: Vec::new(),
            summary: None,
        }
    }

    fn valid(path: &Path, summary: T, warnings: Vec<String>) -> Self {
        Self {
            valid: true,
            path: path.display().to_string(),
            error: None,
            warnings,
            summary: Some(summary),
        }
    }
}

#[derive(Serialize)]
struct ConfigSummary {
    name: String,
    device: String,
    poll_timeout_ms: u64,
    channel_capacity: usize,
    drop_policy: DropPolicy,
}

#[derive(Serialize)]
struct CalibrationSummary {
    acc_bias: Vector3,
    acc_scale: Vector3,
    gyro_bias: Vector3,
    gyro_scale: Vector3,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let config = args.config.as_deref().map(|path| {
        info!(config = %path.display(), "Validating configuration");
        validate_config(path)
    });
    let calibration = args.calibration.as_deref().map(|path| {
        info!(calibration = %path.display(), "Validating calibration");
        validate_calibration(path)
    });

    let result = ValidationResult {
        valid: config.as_ref().is_none_or(|r| r.valid)
            && calibration.as_ref().is_none_or(|r| r.valid),
        config,
        calibration,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Validation failed")
    }
}

fn validate_config(path: &Path) -> FileResult<ConfigSummary> {
    if !path.exists() {
        return FileResult::invalid(path, format!("File not found: {}", path.display()));
    }

    match ConfigLoader::load_from_path(path) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            let summary = ConfigSummary {
                name: config.name,
                device: config.device.display().to_string(),
                poll_timeout_ms: config.acquisition.poll_timeout_ms,
                channel_capacity: config.acquisition.channel_capacity,
                drop_policy: config.acquisition.drop_policy,
            };
            FileResult::valid(path, summary, warnings)
        }
        Err(e) => FileResult::invalid(path, e),
    }
}

fn validate_calibration(path: &Path) -> FileResult<CalibrationSummary> {
    if !path.exists() {
        return FileResult::invalid(path, format!("File not found: {}", path.display()));
    }

    match ConfigLoader::load_calibration_from_path(path) {
        Ok(store) => {
            let warnings = calibration_warnings(&store);
            let summary = CalibrationSummary {
                acc_bias: store.accel_bias(),
                acc_scale: store.accel_scale(),
                gyro_bias: store.gyro_bias(),
                gyro_scale: store.gyro_scale(),
            };
            FileResult::valid(path, summary, warnings)
        }
        Err(e) => FileResult::invalid(path, e),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &DriverConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.acquisition.poll_timeout_ms > MAX_POLL_TIMEOUT_MS / 2 {
        warnings.push(format!(
            "poll_timeout_ms {} delays stop by up to that long",
            config.acquisition.poll_timeout_ms
        ));
    }

    // One report carries at most three samples; a tiny queue drops under any jitter
    if config.acquisition.channel_capacity < 3 {
        warnings.push(format!(
            "channel_capacity {} is smaller than one report",
            config.acquisition.channel_capacity
        ));
    }

    if let Some(ref path) = config.calibration_override {
        if !path.exists() {
            warnings.push(format!(
                "calibration_override {} does not exist",
                path.display()
            ));
        }
    }

    warnings
}

/// A zero scale silences an axis entirely
fn calibration_warnings(store: &CalibrationStore) -> Vec<String> {
    let mut warnings = Vec::new();
    for (name, scale) in [("acc_scale", store.accel_scale()), ("gyro_scale", store.gyro_scale())] {
        if [scale.x, scale.y, scale.z].contains(&0.0) {
            warnings.push(format!("{name} has a zero component"));
        }
    }
    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if let Some(ref config) = result.config {
        print_file_result("Configuration", config, |summary| {
            println!("\n  Name: {}", summary.name);
            println!("  Device: {}", summary.device);
            println!("  Poll timeout: {} ms", summary.poll_timeout_ms);
            println!("  Channel capacity: {}", summary.channel_capacity);
            println!("  Drop policy: {:?}", summary.drop_policy);
        });
    }

    if let Some(ref calibration) = result.calibration {
        print_file_result("Calibration", calibration, |summary| {
            println!("\n  acc_bias:   {:?}", summary.acc_bias);
            println!("  acc_scale:  {:?}", summary.acc_scale);
            println!("  gyro_bias:  {:?}", summary.gyro_bias);
            println!("  gyro_scale: {:?}", summary.gyro_scale);
        });
    }
}

fn print_file_result<T>(kind: &str, result: &FileResult<T>, print_summary: impl Fn(&T)) {
    if result.valid {
        println!("✓ {} is valid: {}", kind, result.path);

        if let Some(ref summary) = result.summary {
            print_summary(summary);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ {} is invalid: {}", kind, result.path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
    println!();
}
