//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ImuSourceKind, StationConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    imu_source: String,
    camera_source: String,
    buffer_capacity: usize,
    history_capacity: usize,
    window_s: f64,
    bind: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

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
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(station) => {
            let warnings = collect_warnings(&station);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", station.version),
                    imu_source: format!("{:?}", station.imu.source),
                    camera_source: format!("{:?}", station.camera.source),
                    buffer_capacity: station.imu.buffer_capacity,
                    history_capacity: station.sync.history_capacity,
                    window_s: station.sync.window_s,
                    bind: station.server.bind.clone(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(station: &StationConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    // Only the mock rate is known up front
    if station.imu.source == ImuSourceKind::Mock {
        let per_window = station.imu.mock_rate_hz * station.sync.window_s;
        if per_window > station.imu.buffer_capacity as f64 {
            warnings.push(format!(
                "imu.buffer_capacity ({}) holds less than one window of samples (~{:.0}); \
                 bundles will be truncated",
                station.imu.buffer_capacity, per_window
            ));
        }
    }

    if station.sync.window_s < station.camera.period().as_secs_f64() {
        warnings.push(format!(
            "sync.window_s ({}) is shorter than the frame period; some samples belong to no bundle",
            station.sync.window_s
        ));
    }

    let bind_port = station
        .server
        .bind
        .rsplit(':')
        .next()
        .and_then(|p| p.parse::<u16>().ok());
    if station.server.metrics_port != 0 && bind_port == Some(station.server.metrics_port) {
        warnings.push(format!(
            "server.metrics_port ({}) collides with the query server port",
            station.server.metrics_port
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Inertial source: {}", summary.imu_source);
            println!("  Camera source: {}", summary.camera_source);
            println!("  Buffer capacity: {}", summary.buffer_capacity);
            println!("  History capacity: {}", summary.history_capacity);
            println!("  Window: {} s", summary.window_s);
            println!("  Bind: {}", summary.bind);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
