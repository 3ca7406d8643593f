//! V4L2 camera source
//!
//! Negotiates MJPG (preferred) or YUYV and converts every buffer to RGB8.

use contracts::{CameraFrame, CameraSource, ContractError};
use std::time::Duration;

use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

use crate::error::{IngestionError, Result};

const BUFFER_COUNT: u32 = 4;

/// Pause after a failed capture so a dead device does not spin the loop
const CAPTURE_RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// Consecutive capture failures
///
/// Only the first failure of a streak is reported at `warn`.
#[derive(Debug, Default)]
struct FailureStreak {
    count: u64,
}

impl FailureStreak {
    /// Count a failure; true when it starts a new streak
    fn fail(&mut self) -> bool {
        self.count += 1;
        self.count == 1
    }

    /// End the streak, returning its length
    fn recover(&mut self) -> u64 {
        std::mem::take(&mut self.count)
    }
}

/// Video4Linux2 capture device
pub struct V4lCamera {
    name: String,
    stream: MmapStream<'static>,
    width: u32,
    height: u32,
    fourcc: FourCC,
    failures: FailureStreak,
}

impl V4lCamera {
    /// Open `/dev/video{index}` at the requested resolution
    pub fn open(index: usize, width: u32, height: u32) -> Result<Self> {
        let name = format!("/dev/video{index}");
        let open_err = |e: std::io::Error| IngestionError::transport_open(&name, e.to_string());

        let dev = Device::new(index).map_err(open_err)?;

        let mjpg = FourCC::new(b"MJPG");
        let yuyv = FourCC::new(b"YUYV");

        let mut format = dev.format().map_err(open_err)?;
        format.width = width;
        format.height = height;
        format.fourcc = mjpg;
        let mut actual = dev.set_format(&format).map_err(open_err)?;

        if actual.fourcc != mjpg {
            format.fourcc = yuyv;
            actual = dev.set_format(&format).map_err(open_err)?;
        }
        if actual.fourcc != mjpg && actual.fourcc != yuyv {
            return Err(IngestionError::transport_open(
                &name,
                format!("unsupported pixel format {}", actual.fourcc),
            ));
        }

        info!(
            device = %name,
            width = actual.width,
            height = actual.height,
            fourcc = %actual.fourcc,
            "V4L2 camera format configured"
        );

        let stream =
            MmapStream::with_buffers(&dev, Type::VideoCapture, BUFFER_COUNT).map_err(open_err)?;

        Ok(Self {
            name,
            stream,
            width: actual.width,
            height: actual.height,
            fourcc: actual.fourcc,
            failures: FailureStreak::default(),
        })
    }

    fn decode(&self, buf: &[u8]) -> std::result::Result<CameraFrame, ContractError> {
        if self.fourcc == FourCC::new(b"MJPG") {
            let rgb = image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg)
                .map_err(|e| ContractError::transport_read(&self.name, e.to_string()))?
                .to_rgb8();
            let (w, h) = rgb.dimensions();
            CameraFrame::new(w, h, rgb.into_raw())
        } else {
            CameraFrame::new(self.width, self.height, yuyv_to_rgb(buf, self.width, self.height)?)
        }
    }
}

impl CameraSource for V4lCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_frame(&mut self) -> std::result::Result<Option<CameraFrame>, ContractError> {
        let buf = match self.stream.next() {
            Ok((buf, _meta)) => buf.to_vec(),
            Err(e) => {
                if self.failures.fail() {
                    warn!(device = %self.name, error = %e, "failed to capture frame");
                } else {
                    debug!(
                        device = %self.name,
                        failures = self.failures.count,
                        error = %e,
                        "frame capture still failing"
                    );
                }
                std::thread::sleep(CAPTURE_RETRY_BACKOFF);
                return Ok(None);
            }
        };
        let streak = self.failures.recover();
        if streak > 0 {
            info!(device = %self.name, failures = streak, "frame capture recovered");
        }
        self.decode(&buf).map(Some)
    }
}

/// Convert packed YUYV 4:2:2 to RGB8 (BT.601)
fn yuyv_to_rgb(buf: &[u8], width: u32, height: u32) -> std::result::Result<Vec<u8>, ContractError> {
    let pixels = width as usize * height as usize;
    if buf.len() < pixels * 2 {
        return Err(ContractError::Shape {
            what: "YUYV buffer",
            expected: format!("{} bytes", pixels * 2),
            actual: format!("{} bytes", buf.len()),
        });
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for chunk in buf[..pixels * 2].chunks_exact(4) {
        let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
        rgb.extend_from_slice(&yuv_pixel(y0, u, v));
        rgb.extend_from_slice(&yuv_pixel(y1, u, v));
    }
    Ok(rgb)
}

fn yuv_pixel(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;
    let clamp = |x: f32| x.round().clamp(0.0, 255.0) as u8;
    [
        clamp(y + 1.402 * v),
        clamp(y - 0.344_136 * u - 0.714_136 * v),
        clamp(y + 1.772 * u),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_grey_is_grey() {
        let buf = [128u8, 128, 128, 128];
        let rgb = yuyv_to_rgb(&buf, 2, 1).unwrap();
        assert_eq!(rgb, vec![128, 128, 128, 128, 128, 128]);
    }

    #[test]
    fn test_failure_streak_warns_once() {
        let mut streak = FailureStreak::default();
        assert!(streak.fail());
        assert!(!streak.fail());
        assert!(!streak.fail());
        assert_eq!(streak.recover(), 3);
        assert_eq!(streak.recover(), 0);
        assert!(streak.fail());
    }

    #[test]
    fn test_yuyv_short_buffer_rejected() {
        assert!(yuyv_to_rgb(&[0u8; 4], 4, 4).is_err());
    }
}
