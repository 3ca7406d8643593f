//! SynchronizedBundle / LatestState - Sync Engine output
//!
//! One camera frame timestamp paired with the inertial samples that
//! precede it, and the single published state consumed by queries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{DistanceMap, EncodedFrame, InertialSample};

/// Frame timestamp plus its windowed inertial samples
///
/// Every sample `s` satisfies `0 < frame_timestamp - s.timestamp < window`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynchronizedBundle {
    /// Wall-clock acquisition time of the frame (seconds)
    pub frame_timestamp: f64,

    /// Samples in buffer (arrival) order
    pub samples: Vec<InertialSample>,
}

impl SynchronizedBundle {
    /// Number of associated samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Complete result of one frame cycle
///
/// Replaced wholesale on every published cycle; readers always see all
/// three parts from the same cycle.
#[derive(Debug, Clone)]
pub struct LatestState {
    /// Monotonic cycle counter (1-based)
    pub cycle: u64,

    /// JPEG-encoded camera frame
    pub encoded_frame: EncodedFrame,

    /// Distance map in metres
    pub distance_map: Arc<DistanceMap>,

    /// Inertial bundle for this frame
    pub bundle: Arc<SynchronizedBundle>,
}

impl LatestState {
    /// Timestamp of the frame this state was built from
    pub fn frame_timestamp(&self) -> f64 {
        self.bundle.frame_timestamp
    }
}
