//! Sensor payloads - Ingestion and acquisition outputs
//!
//! Inertial samples, camera frames and the depth grids derived from them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// One six-axis inertial reading on the wall-clock timeline
///
/// Immutable once constructed; buffers only insert and evict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertialSample {
    /// Wall-clock timestamp (seconds since the Unix epoch)
    pub timestamp: f64,

    /// Accelerometer x
    pub ax: f64,
    /// Accelerometer y
    pub ay: f64,
    /// Accelerometer z
    pub az: f64,

    /// Gyroscope x
    pub gx: f64,
    /// Gyroscope y
    pub gy: f64,
    /// Gyroscope z
    pub gz: f64,
}

impl InertialSample {
    /// Build a sample from a timestamp and the six motion channels
    /// in `[ax, ay, az, gx, gy, gz]` order.
    pub fn from_channels(timestamp: f64, channels: [f64; 6]) -> Self {
        let [ax, ay, az, gx, gy, gz] = channels;
        Self {
            timestamp,
            ax,
            ay,
            az,
            gx,
            gy,
            gz,
        }
    }

    /// Motion channels in `[ax, ay, az, gx, gy, gz]` order
    pub fn channels(&self) -> [f64; 6] {
        [self.ax, self.ay, self.az, self.gx, self.gy, self.gz]
    }
}

/// Raw RGB8 camera frame, row-major, 3 bytes per pixel
#[derive(Debug, Clone)]
pub struct CameraFrame {
    width: u32,
    height: u32,
    data: Bytes,
}

impl CameraFrame {
    /// Create a frame, checking that the buffer matches the dimensions
    pub fn new(width: u32, height: u32, data: impl Into<Bytes>) -> Result<Self, ContractError> {
        let data = data.into();
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(ContractError::Shape {
                what: "camera frame",
                expected: format!("{width}x{height}x3 = {expected} bytes"),
                actual: format!("{} bytes", data.len()),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed RGB bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame and return the pixel buffer
    pub fn into_data(self) -> Bytes {
        self.data
    }
}

/// Encoded (JPEG) camera frame as served to clients
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Source frame width
    pub width: u32,

    /// Source frame height
    pub height: u32,

    /// Encoded bytes (zero-copy clone)
    pub data: Bytes,
}

impl EncodedFrame {
    /// MIME type of `data`
    pub const CONTENT_TYPE: &'static str = "image/jpeg";
}

/// Row-major grid of `f32` values
///
/// Shared layout of the raw model output ([`DepthMap`]) and the metric
/// result ([`DistanceMap`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl Grid {
    /// Create a grid, checking that `values` covers `width * height` cells
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> Result<Self, ContractError> {
        let expected = width as usize * height as usize;
        if expected == 0 || values.len() != expected {
            return Err(ContractError::Shape {
                what: "grid",
                expected: format!("{width}x{height} = {expected} cells"),
                actual: format!("{} cells", values.len()),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Grid filled with a single value
    pub fn filled(width: u32, height: u32, value: f32) -> Result<Self, ContractError> {
        Self::new(width, height, vec![value; width as usize * height as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value at column `x`, row `y`
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Same-shaped grid with `f` applied to every cell
    pub fn map(&self, f: impl FnMut(f32) -> f32) -> Self {
        Self {
            width: self.width,
            height: self.height,
            values: self.values.iter().copied().map(f).collect(),
        }
    }

    /// Smallest and largest value
    pub fn min_max(&self) -> (f32, f32) {
        self.values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

/// Raw relative depth as produced by the depth-estimation model
pub type DepthMap = Grid;

/// Per-pixel distance in metres
pub type DistanceMap = Grid;
