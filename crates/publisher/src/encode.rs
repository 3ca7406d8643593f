//! Wire encoders
//!
//! - camera frame → JPEG
//! - distance map (metres) → 16-bit grayscale PNG in millimetres

use std::io::Cursor;

use bytes::Bytes;
use contracts::{CameraFrame, ContractError, DistanceMap, EncodedFrame};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageBuffer, ImageFormat, Luma};

pub const JPEG_CONTENT_TYPE: &str = EncodedFrame::CONTENT_TYPE;
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Encode an RGB frame as JPEG
pub fn encode_jpeg(frame: &CameraFrame, quality: u8) -> Result<EncodedFrame, ContractError> {
    let mut buf = Vec::with_capacity(frame.data().len() / 8);
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode(
            frame.data(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ContractError::encoding("jpeg", e.to_string()))?;

    Ok(EncodedFrame {
        width: frame.width(),
        height: frame.height(),
        data: Bytes::from(buf),
    })
}

/// Metres to millimetres, truncated toward zero and saturated to `u16`
///
/// Non-finite values map to 0.
pub fn distance_to_millimetres(distance: &DistanceMap) -> Vec<u16> {
    distance
        .values()
        .iter()
        .map(|&d| (d as f64 * 1000.0) as u16)
        .collect()
}

/// Encode a distance map as a 16-bit grayscale PNG (one millimetre per unit)
pub fn encode_distance_png(distance: &DistanceMap) -> Result<Bytes, ContractError> {
    let (width, height) = distance.dimensions();
    let millimetres = distance_to_millimetres(distance);

    let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(width, height, millimetres).ok_or_else(|| {
            ContractError::encoding("png", format!("buffer does not fit {width}x{height}"))
        })?;

    let mut out = Vec::new();
    DynamicImage::ImageLuma16(buffer)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| ContractError::encoding("png", e.to_string()))?;

    Ok(Bytes::from(out))
}
