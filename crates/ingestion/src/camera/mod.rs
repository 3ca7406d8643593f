//! Camera sources
//!
//! - `mock`: synthetic RGB frames
//! - `v4l2`: Video4Linux2 capture (feature `v4l`)

mod mock;
#[cfg(feature = "v4l")]
mod v4l2;

pub use mock::MockCamera;
#[cfg(feature = "v4l")]
pub use v4l2::V4lCamera;

use contracts::{CameraConfig, CameraSource, CameraSourceKind};

use crate::error::Result;

/// Open the camera described by `config`
///
/// # Errors
/// `TransportOpen` when the device cannot be opened, or when the V4L2
/// source is requested but the crate was built without the `v4l` feature.
pub fn open_camera(config: &CameraConfig) -> Result<Box<dyn CameraSource>> {
    match config.source {
        CameraSourceKind::Mock => Ok(Box::new(MockCamera::new(config.width, config.height))),
        #[cfg(feature = "v4l")]
        CameraSourceKind::V4l => Ok(Box::new(V4lCamera::open(
            config.device_index,
            config.width,
            config.height,
        )?)),
        #[cfg(not(feature = "v4l"))]
        CameraSourceKind::V4l => Err(crate::error::IngestionError::transport_open(
            format!("/dev/video{}", config.device_index),
            "built without the `v4l` feature",
        )),
    }
}
