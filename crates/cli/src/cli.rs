//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::DropPolicy;
use std::path::PathBuf;

/// vive-imu - Vive headset IMU acquisition over hidraw
#[derive(Parser, Debug)]
#[command(
    name = "vive-imu",
    author,
    version,
    about = "Vive headset IMU acquisition",
    long_about = "Reads the IMU of a Vive headset over Linux hidraw.\n\n\
                  Runs the startup sequence (firmware version, calibration download, \n\
                  lighthouse enable), then streams calibrated accelerometer and \n\
                  gyroscope samples with duplicate suppression."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "VIVE_IMU_VERBOSE")]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "VIVE_IMU_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire IMU samples until interrupted
    Run(RunArgs),

    /// Validate a driver configuration or calibration document
    Validate(ValidateArgs),

    /// Read firmware version and calibration from the headset
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to driver configuration file (TOML or JSON)
    #[arg(short, long, env = "VIVE_IMU_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override hidraw device node from configuration
    #[arg(short, long, env = "VIVE_IMU_DEVICE")]
    pub device: Option<PathBuf>,

    /// Use a simulated headset instead of hidraw
    #[arg(long)]
    pub simulate: bool,

    /// Simulated sample rate in Hz
    #[arg(long, default_value = "1000", requires = "simulate")]
    pub simulate_hz: u32,

    /// Read calibration from this file instead of the headset
    #[arg(long, env = "VIVE_IMU_CALIBRATION")]
    pub calibration: Option<PathBuf>,

    /// Maximum number of samples to consume (0 = unlimited)
    #[arg(long, default_value = "0", env = "VIVE_IMU_MAX_SAMPLES")]
    pub max_samples: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "VIVE_IMU_TIMEOUT")]
    pub timeout: u64,

    /// Override readiness wait bound in milliseconds
    #[arg(long, env = "VIVE_IMU_POLL_TIMEOUT_MS")]
    pub poll_timeout_ms: Option<u64>,

    /// Override sample channel capacity
    #[arg(long, env = "VIVE_IMU_BUFFER_SIZE")]
    pub buffer_size: Option<usize>,

    /// Override what to drop when the consumer falls behind
    #[arg(long, value_enum, env = "VIVE_IMU_DROP_POLICY")]
    pub drop_policy: Option<DropPolicyArg>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "VIVE_IMU_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
#[command(group(clap::ArgGroup::new("input").required(true).multiple(true)))]
pub struct ValidateArgs {
    /// Driver configuration file to validate
    #[arg(short, long, group = "input")]
    pub config: Option<PathBuf>,

    /// Calibration document to validate
    #[arg(long, group = "input")]
    pub calibration: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to driver configuration file
    #[arg(short, long, env = "VIVE_IMU_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override hidraw device node from configuration
    #[arg(short, long, env = "VIVE_IMU_DEVICE")]
    pub device: Option<PathBuf>,

    /// Query a simulated headset instead of hidraw
    #[arg(long)]
    pub simulate: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Backpressure policy
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropPolicyArg {
    /// Drop the sample that did not fit
    DropNewest,
    /// Evict the oldest queued sample
    DropOldest,
}

impl From<DropPolicyArg> for DropPolicy {
    fn from(arg: DropPolicyArg) -> Self {
        match arg {
            DropPolicyArg::DropNewest => DropPolicy::DropNewest,
            DropPolicyArg::DropOldest => DropPolicy::DropOldest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["vive-imu", "run", "--simulate"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.simulate);
        assert_eq!(args.simulate_hz, 1000);
        assert_eq!(args.max_samples, 0);
        assert_eq!(args.metrics_port, 0);
        assert!(args.drop_policy.is_none());
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "vive-imu",
            "-vv",
            "run",
            "--device",
            "/dev/hidraw4",
            "--poll-timeout-ms",
            "50",
            "--drop-policy",
            "drop-oldest",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.device, Some(PathBuf::from("/dev/hidraw4")));
        assert_eq!(args.poll_timeout_ms, Some(50));
        assert_eq!(
            args.drop_policy.map(DropPolicy::from),
            Some(DropPolicy::DropOldest)
        );
    }

    #[test]
    fn test_simulate_hz_requires_simulate() {
        assert!(Cli::try_parse_from(["vive-imu", "run", "--simulate-hz", "500"]).is_err());
    }

    #[test]
    fn test_validate_requires_input() {
        assert!(Cli::try_parse_from(["vive-imu", "validate"]).is_err());
        assert!(Cli::try_parse_from(["vive-imu", "validate", "--calibration", "c.json"]).is_ok());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["vive-imu", "-q", "-v", "info"]).is_err());
    }
}
