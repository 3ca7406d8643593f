//! Depth → distance conversion and the built-in depth estimator.
//!
//! Normalization is per frame:
//!
//! ```text
//! norm     = (raw - min(raw)) / (max(raw) - min(raw) + eps)
//! distance = MIN_DIST + (1 - norm) * (MAX_DIST - MIN_DIST)
//! ```
//!
//! so the largest raw value maps to `MIN_DIST` (closest) and a uniform
//! frame maps to `MAX_DIST` everywhere.

use contracts::{CameraFrame, ContractError, DepthConfig, DepthEstimator, DepthMap, DistanceMap, Grid};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb};

/// Distance mapping parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceRange {
    /// Distance of the largest raw value (metres)
    pub min_m: f64,
    /// Distance of the smallest raw value (metres)
    pub max_m: f64,
    /// Zero-range guard
    pub epsilon: f64,
}

impl Default for DistanceRange {
    fn default() -> Self {
        Self::from(&DepthConfig::default())
    }
}

impl From<&DepthConfig> for DistanceRange {
    fn from(config: &DepthConfig) -> Self {
        Self {
            min_m: config.min_distance_m,
            max_m: config.max_distance_m,
            epsilon: config.epsilon,
        }
    }
}

/// Convert a raw depth map to metric distances
pub fn depth_to_distance(raw: &DepthMap, range: &DistanceRange) -> DistanceMap {
    let (lo, hi) = raw.min_max();
    let (lo, hi) = (lo as f64, hi as f64);
    let scale = hi - lo + range.epsilon;
    let span = range.max_m - range.min_m;

    raw.map(|v| {
        let norm = (v as f64 - lo) / scale;
        (range.min_m + (1.0 - norm) * span) as f32
    })
}

/// Resize a frame to the model input size (bilinear)
///
/// Frames that already match are returned as a cheap clone.
pub fn prepare_input(frame: &CameraFrame, size: (u32, u32)) -> Result<CameraFrame, ContractError> {
    let (width, height) = size;
    if (frame.width(), frame.height()) == size {
        return Ok(frame.clone());
    }

    let view: ImageBuffer<Rgb<u8>, &[u8]> =
        ImageBuffer::from_raw(frame.width(), frame.height(), frame.data()).ok_or_else(|| {
            ContractError::Shape {
                what: "camera frame",
                expected: format!("{}x{}x3 bytes", frame.width(), frame.height()),
                actual: format!("{} bytes", frame.data().len()),
            }
        })?;

    let resized = imageops::resize(&view, width, height, FilterType::Triangle);
    CameraFrame::new(width, height, resized.into_raw())
}

/// Deterministic monocular depth heuristic
///
/// Brighter pixels and pixels lower in the image score as closer. Output
/// is relative inverse depth (larger = closer), like learned monocular
/// models, so it plugs into the same normalization.
#[derive(Debug, Clone)]
pub struct LuminanceDepthEstimator {
    input_width: u32,
    input_height: u32,
}

impl LuminanceDepthEstimator {
    pub fn new(input_width: u32, input_height: u32) -> Self {
        Self {
            input_width,
            input_height,
        }
    }
}

impl From<&DepthConfig> for LuminanceDepthEstimator {
    fn from(config: &DepthConfig) -> Self {
        Self::new(config.input_width, config.input_height)
    }
}

impl DepthEstimator for LuminanceDepthEstimator {
    fn name(&self) -> &str {
        "luminance"
    }

    fn input_size(&self) -> (u32, u32) {
        (self.input_width, self.input_height)
    }

    fn estimate_depth(&mut self, image: &CameraFrame) -> Result<DepthMap, ContractError> {
        if (image.width(), image.height()) != self.input_size() {
            return Err(ContractError::inference(format!(
                "expected {}x{} input, got {}x{}",
                self.input_width,
                self.input_height,
                image.width(),
                image.height()
            )));
        }

        let w = image.width() as usize;
        let h = image.height() as usize;
        let rows = (h.max(2) - 1) as f32;

        let values = image
            .data()
            .chunks_exact(3)
            .enumerate()
            .map(|(i, px)| {
                let luma = (0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32)
                    / 255.0;
                let row = (i / w) as f32 / rows;
                0.6 * luma + 0.4 * row
            })
            .collect();

        Grid::new(image.width(), image.height(), values)
    }
}
