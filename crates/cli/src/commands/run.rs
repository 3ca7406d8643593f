//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::StationConfig;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let mut station = load_station(args)?;
    apply_overrides(&mut station, args);

    config_loader::ConfigLoader::validate(&station)
        .context("Configuration invalid after command-line overrides")?;

    info!(
        imu_source = ?station.imu.source,
        camera_source = ?station.camera.source,
        bind = %station.server.bind,
        window_s = station.sync.window_s,
        frame_rate_hz = station.camera.frame_rate_hz,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&station);
        return Ok(());
    }

    info!("Starting station...");
    let stats = Pipeline::new(pipeline_config(station, args))
        .run(shutdown_signal())
        .await
        .context("Station execution failed")?;

    info!(
        frames_published = stats.frames_published(),
        samples_ingested = stats.ingestion.samples_ingested,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        stop_reason = %stats.stop_reason,
        "Station stopped"
    );
    stats.print_summary();

    Ok(())
}

fn load_station(args: &RunArgs) -> Result<StationConfig> {
    match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => {
            warn!("No configuration file given, using defaults");
            Ok(StationConfig::default())
        }
    }
}

/// Run limits and exporter port; 0 means unlimited / disabled
fn pipeline_config(station: StationConfig, args: &RunArgs) -> PipelineConfig {
    PipelineConfig {
        metrics_port: (station.server.metrics_port != 0).then_some(station.server.metrics_port),
        max_frames: (args.max_frames != 0).then_some(args.max_frames),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
        station,
    }
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(station: &mut StationConfig, args: &RunArgs) {
    if let Some(source) = args.imu_source {
        info!(source = ?source, "Overriding inertial source from CLI");
        station.imu.source = source.into();
    }
    if let Some(ref port) = args.imu_port {
        info!(port = %port, "Overriding inertial port from CLI");
        station.imu.port = port.clone();
    }
    if let Some(source) = args.camera_source {
        info!(source = ?source, "Overriding camera source from CLI");
        station.camera.source = source.into();
    }
    if let Some(ref bind) = args.bind {
        info!(bind = %bind, "Overriding bind address from CLI");
        station.server.bind = bind.clone();
    }
    if let Some(port) = args.metrics_port {
        info!(port, "Overriding metrics port from CLI");
        station.server.metrics_port = port;
    }
}

/// Ctrl+C and SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(station: &StationConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Inertial:");
    println!("  Source: {:?}", station.imu.source);
    println!("  Port: {} @ {} baud", station.imu.port, station.imu.baud_rate);
    println!("  Buffer capacity: {}", station.imu.buffer_capacity);
    println!("\nCamera:");
    println!("  Source: {:?}", station.camera.source);
    println!(
        "  Capture: {}x{} @ {} Hz",
        station.camera.width, station.camera.height, station.camera.frame_rate_hz
    );
    println!("\nDepth:");
    println!(
        "  Model input: {}x{}",
        station.depth.input_width, station.depth.input_height
    );
    println!(
        "  Distance range: {} m .. {} m",
        station.depth.min_distance_m, station.depth.max_distance_m
    );
    println!("\nSync:");
    println!("  Window: {} s", station.sync.window_s);
    println!("  History capacity: {}", station.sync.history_capacity);
    println!("\nServer:");
    println!("  Bind: {}", station.server.bind);
    if station.server.metrics_port == 0 {
        println!("  Metrics: disabled");
    } else {
        println!("  Metrics port: {}", station.server.metrics_port);
    }
    println!();
}
