//! StationConfig - Config Loader output
//!
//! Describes the whole acquisition station: inertial transport, camera,
//! depth model parameters, synchronization policy and query server.
//! Every field has a default equal to the reference deployment, so an
//! empty document is a valid (mock) configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Slowest loop rate accepted by validation (Hz)
pub const MIN_RATE_HZ: f64 = 0.001;

/// Fastest loop rate accepted by validation (Hz)
pub const MAX_RATE_HZ: f64 = 10_000.0;

/// Period of a loop running at `rate_hz`
///
/// The rate is clamped to `MIN_RATE_HZ..=MAX_RATE_HZ` (NaN counts as the
/// minimum), so the result is always a representable `Duration`.
pub fn rate_period(rate_hz: f64) -> Duration {
    let rate = if rate_hz.is_nan() {
        MIN_RATE_HZ
    } else {
        rate_hz.clamp(MIN_RATE_HZ, MAX_RATE_HZ)
    };
    Duration::from_secs_f64(1.0 / rate)
}

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete station configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StationConfig {
    /// Configuration version
    pub version: ConfigVersion,

    /// Inertial transport and buffer
    #[validate(nested)]
    pub imu: ImuConfig,

    /// Camera source and cadence
    #[validate(nested)]
    pub camera: CameraConfig,

    /// Depth model input and distance conversion
    #[validate(nested)]
    pub depth: DepthConfig,

    /// Windowing and history
    #[validate(nested)]
    pub sync: SyncConfig,

    /// Query server
    #[validate(nested)]
    pub server: ServerConfig,
}

/// Inertial transport kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImuSourceKind {
    /// Serial port, one record per line
    Serial,
    /// Recorded log file
    Replay,
    /// Synthetic generator
    #[default]
    Mock,
}

/// Inertial stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ImuConfig {
    /// Transport kind
    pub source: ImuSourceKind,

    /// Serial device path (serial only)
    pub port: String,

    /// Serial baud rate
    #[validate(range(min = 1))]
    pub baud_rate: u32,

    /// Blocking read timeout in milliseconds
    #[validate(range(min = 1))]
    pub read_timeout_ms: u64,

    /// Ring buffer capacity (samples)
    #[validate(range(min = 1))]
    pub buffer_capacity: usize,

    /// Recorded log path (replay only)
    pub replay_path: Option<PathBuf>,

    /// Restart the replay at end of file
    pub replay_loop: bool,

    /// Synthetic sample rate (mock only)
    #[validate(range(min = 0.001, max = 10_000.0))]
    pub mock_rate_hz: f64,

    /// Pause after a transport error before the next read
    pub error_backoff_ms: u64,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            source: ImuSourceKind::default(),
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 10,
            buffer_capacity: 2000,
            replay_path: None,
            replay_loop: false,
            mock_rate_hz: 200.0,
            error_backoff_ms: 10,
        }
    }
}

impl ImuConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

/// Camera source kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraSourceKind {
    /// Synthetic frames
    #[default]
    Mock,
    /// Video4Linux2 capture device
    V4l,
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CameraConfig {
    /// Source kind
    pub source: CameraSourceKind,

    /// Capture device index (`/dev/videoN`)
    pub device_index: usize,

    /// Requested capture width
    #[validate(range(min = 1))]
    pub width: u32,

    /// Requested capture height
    #[validate(range(min = 1))]
    pub height: u32,

    /// Frame loop cadence
    #[validate(range(min = 0.001, max = 10_000.0))]
    pub frame_rate_hz: f64,

    /// JPEG quality for the published frame
    #[validate(range(min = 1, max = 100))]
    pub jpeg_quality: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: CameraSourceKind::default(),
            device_index: 1,
            width: 800,
            height: 600,
            frame_rate_hz: 30.0,
            jpeg_quality: 90,
        }
    }
}

impl CameraConfig {
    /// Loop period derived from `frame_rate_hz`
    pub fn period(&self) -> Duration {
        rate_period(self.frame_rate_hz)
    }
}

/// Depth conversion configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DepthConfig {
    /// Model input width
    #[validate(range(min = 1))]
    pub input_width: u32,

    /// Model input height
    #[validate(range(min = 1))]
    pub input_height: u32,

    /// Distance assigned to the largest raw value (metres)
    #[validate(range(min = 0.0))]
    pub min_distance_m: f64,

    /// Distance assigned to the smallest raw value (metres)
    #[validate(range(min = 0.0))]
    pub max_distance_m: f64,

    /// Guard against a zero raw range
    #[validate(range(exclusive_min = 0.0))]
    pub epsilon: f64,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            input_width: 518,
            input_height: 518,
            min_distance_m: 1.0,
            max_distance_m: 5.0,
            epsilon: 1e-8,
        }
    }
}

/// Synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SyncConfig {
    /// Trailing window before each frame (seconds)
    #[validate(range(exclusive_min = 0.0))]
    pub window_s: f64,

    /// Bundle history capacity
    #[validate(range(min = 1))]
    pub history_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            window_s: 1.0,
            history_capacity: 100,
        }
    }
}

/// Query server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP bind address
    #[validate(length(min = 1))]
    pub bind: String,

    /// Prometheus exporter port (0 = disabled)
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            metrics_port: 9000,
        }
    }
}
