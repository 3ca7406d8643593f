//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Wall-clock seconds since the Unix epoch (`f64`) is the only timeline
//! - Device-relative counters are translated at ingestion and never leave it

mod clock;
mod config;
mod error;
mod sensor;
mod sensor_source;
mod sync;

pub use clock::{ManualClock, SystemClock, WallClock};
pub use config::*;
pub use error::*;
pub use sensor::*;
pub use sensor_source::{CameraSource, DepthEstimator, InertialTransport, SampleSink};
pub use sync::*;
