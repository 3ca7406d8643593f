//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::{CameraSourceKind, ImuSourceKind};
use std::path::PathBuf;

/// Depth IMU Syncer - depth camera and IMU synchronization station
#[derive(Parser, Debug)]
#[command(
    name = "depth-imu-syncer",
    author,
    version,
    about = "Depth camera / IMU synchronization station",
    long_about = "Acquires an inertial stream and camera frames, estimates per-frame distance \n\
                  maps, pairs each frame with the inertial samples preceding it, and serves \n\
                  the latest result over HTTP."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DEPTH_IMU_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DEPTH_IMU_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the acquisition loops and the query server
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "DEPTH_IMU_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the inertial transport kind
    #[arg(long, value_enum, env = "DEPTH_IMU_SOURCE")]
    pub imu_source: Option<ImuSourceArg>,

    /// Override the inertial serial port
    #[arg(long, env = "DEPTH_IMU_PORT")]
    pub imu_port: Option<String>,

    /// Override the camera source
    #[arg(long, value_enum, env = "DEPTH_IMU_CAMERA")]
    pub camera_source: Option<CameraSourceArg>,

    /// Override the HTTP bind address
    #[arg(long, env = "DEPTH_IMU_BIND")]
    pub bind: Option<String>,

    /// Override the metrics server port (0 = disabled)
    #[arg(long, env = "DEPTH_IMU_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Stop after this many published frames (0 = unlimited)
    #[arg(long, default_value = "0", env = "DEPTH_IMU_MAX_FRAMES")]
    pub max_frames: u64,

    /// Stop after this many seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "DEPTH_IMU_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without opening any device
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the effective configuration (defaults filled in) as TOML
    #[arg(long, conflicts_with = "json")]
    pub effective: bool,
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

/// Inertial transport kind
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ImuSourceArg {
    Serial,
    Replay,
    Mock,
}

impl From<ImuSourceArg> for ImuSourceKind {
    fn from(arg: ImuSourceArg) -> Self {
        match arg {
            ImuSourceArg::Serial => Self::Serial,
            ImuSourceArg::Replay => Self::Replay,
            ImuSourceArg::Mock => Self::Mock,
        }
    }
}

/// Camera source kind
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CameraSourceArg {
    Mock,
    V4l,
}

impl From<CameraSourceArg> for CameraSourceKind {
    fn from(arg: CameraSourceArg) -> Self {
        match arg {
            CameraSourceArg::Mock => Self::Mock,
            CameraSourceArg::V4l => Self::V4l,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "depth-imu-syncer",
            "run",
            "--imu-source",
            "serial",
            "--imu-port",
            "/dev/ttyACM0",
            "--camera-source",
            "v4l",
            "--max-frames",
            "10",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert!(args.config.is_none());
                assert!(matches!(args.imu_source, Some(ImuSourceArg::Serial)));
                assert_eq!(args.imu_port.as_deref(), Some("/dev/ttyACM0"));
                assert!(matches!(args.camera_source, Some(CameraSourceArg::V4l)));
                assert_eq!(args.max_frames, 10);
                assert_eq!(args.timeout, 0);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["depth-imu-syncer", "-q", "-v", "validate"]);
        assert!(result.is_err());
    }
}
