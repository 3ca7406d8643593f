//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{ImuSourceKind, StationConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    inertial: InertialInfo,
    camera: CameraInfo,
    depth: DepthInfo,
    sync: SyncInfo,
    routes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_endpoint: Option<String>,
}

#[derive(Serialize)]
struct InertialInfo {
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    buffer_capacity: usize,
}

#[derive(Serialize)]
struct CameraInfo {
    source: String,
    device_index: usize,
    resolution: String,
    frame_rate_hz: f64,
}

#[derive(Serialize)]
struct DepthInfo {
    model_input: String,
    min_distance_m: f64,
    max_distance_m: f64,
}

#[derive(Serialize)]
struct SyncInfo {
    window_s: f64,
    history_capacity: usize,
}

const ROUTES: [&str; 6] = [
    "/frame_rgb",
    "/frame_depth_raw",
    "/imu_buffer",
    "/imu_raw",
    "/bundles",
    "/status",
];

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let station = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&station);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else if args.effective {
        let toml = config_loader::ConfigLoader::to_toml(&station)
            .context("Failed to serialize effective configuration")?;
        println!("{}", toml);
    } else {
        print_config_info(&station);
    }

    Ok(())
}

/// Where the inertial records come from
fn inertial_endpoint(station: &StationConfig) -> Option<String> {
    match station.imu.source {
        ImuSourceKind::Serial => Some(format!("{} @ {} baud", station.imu.port, station.imu.baud_rate)),
        ImuSourceKind::Replay => station
            .imu
            .replay_path
            .as_ref()
            .map(|p| p.display().to_string()),
        ImuSourceKind::Mock => Some(format!("{} Hz synthetic", station.imu.mock_rate_hz)),
    }
}

fn build_config_info(station: &StationConfig) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", station.version),
        inertial: InertialInfo {
            source: format!("{:?}", station.imu.source),
            endpoint: inertial_endpoint(station),
            buffer_capacity: station.imu.buffer_capacity,
        },
        camera: CameraInfo {
            source: format!("{:?}", station.camera.source),
            device_index: station.camera.device_index,
            resolution: format!("{}x{}", station.camera.width, station.camera.height),
            frame_rate_hz: station.camera.frame_rate_hz,
        },
        depth: DepthInfo {
            model_input: format!(
                "{}x{}",
                station.depth.input_width, station.depth.input_height
            ),
            min_distance_m: station.depth.min_distance_m,
            max_distance_m: station.depth.max_distance_m,
        },
        sync: SyncInfo {
            window_s: station.sync.window_s,
            history_capacity: station.sync.history_capacity,
        },
        routes: ROUTES
            .iter()
            .map(|route| format!("http://{}{}", station.server.bind, route))
            .collect(),
        metrics_endpoint: (station.server.metrics_port != 0)
            .then(|| format!("http://0.0.0.0:{}/metrics", station.server.metrics_port)),
    }
}

fn print_config_info(station: &StationConfig) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Depth IMU Syncer Configuration                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📈 Inertial");
    println!("   ├─ Source: {:?}", station.imu.source);
    if let Some(endpoint) = inertial_endpoint(station) {
        println!("   ├─ Endpoint: {}", endpoint);
    }
    println!("   └─ Buffer capacity: {}", station.imu.buffer_capacity);

    println!("\n📷 Camera");
    println!("   ├─ Source: {:?}", station.camera.source);
    println!("   ├─ Device: /dev/video{}", station.camera.device_index);
    println!(
        "   ├─ Resolution: {}x{}",
        station.camera.width, station.camera.height
    );
    println!("   └─ Frame rate: {} Hz", station.camera.frame_rate_hz);

    println!("\n🌊 Depth");
    println!(
        "   ├─ Model input: {}x{}",
        station.depth.input_width, station.depth.input_height
    );
    println!(
        "   └─ Distance range: {} m .. {} m",
        station.depth.min_distance_m, station.depth.max_distance_m
    );

    println!("\n⚙️  Sync Settings");
    println!("   ├─ Window: {} s", station.sync.window_s);
    println!("   └─ History capacity: {}", station.sync.history_capacity);

    println!("\n📤 Routes ({})", ROUTES.len());
    for (i, route) in ROUTES.iter().enumerate() {
        let prefix = if i == ROUTES.len() - 1 { "└─" } else { "├─" };
        println!("   {} http://{}{}", prefix, station.server.bind, route);
    }

    println!();
}
