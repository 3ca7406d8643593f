//! # Publisher
//!
//! Latest-state publication and wire encoding.
//!
//! - [`LatestStateSlot`]: single-writer, multi-reader slot replaced by one
//!   atomic pointer swap per frame cycle
//! - [`encode`]: JPEG frame and 16-bit millimetre PNG encoders
//! - [`record`]: JSON records served by the query layer

pub mod encode;
pub mod record;
mod slot;

pub use encode::{
    distance_to_millimetres, encode_distance_png, encode_jpeg, JPEG_CONTENT_TYPE,
    PNG_CONTENT_TYPE,
};
pub use record::{BundleHistoryRecord, BundleRecord, RawBufferRecord};
pub use slot::LatestStateSlot;
