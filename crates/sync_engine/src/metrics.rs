//! Frame loop metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Frame loop counters
///
/// Shared between the loop thread and status readers.
#[derive(Debug)]
pub struct FrameLoopMetrics {
    /// Cycles that published a complete state
    pub published: AtomicU64,

    /// Cycles without a camera frame
    pub skipped: AtomicU64,

    /// Cycles abandoned during inference or encoding
    pub failed: AtomicU64,

    /// `f64` bits of the newest published frame timestamp (NaN = none)
    last_frame_timestamp: AtomicU64,
}

impl Default for FrameLoopMetrics {
    fn default() -> Self {
        Self {
            published: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            last_frame_timestamp: AtomicU64::new(f64::NAN.to_bits()),
        }
    }
}

impl FrameLoopMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record published cycle
    pub fn record_published(&self, frame_timestamp: f64) {
        self.last_frame_timestamp
            .store(frame_timestamp.to_bits(), Ordering::Relaxed);
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Record skipped cycle
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record failed cycle
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of published cycles
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Get snapshot
    pub fn snapshot(&self) -> FrameLoopSnapshot {
        let last = f64::from_bits(self.last_frame_timestamp.load(Ordering::Relaxed));
        FrameLoopSnapshot {
            published: self.published.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            last_frame_timestamp: (!last.is_nan()).then_some(last),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameLoopSnapshot {
    pub published: u64,
    pub skipped: u64,
    pub failed: u64,
    pub last_frame_timestamp: Option<f64>,
}

impl FrameLoopSnapshot {
    pub fn total_cycles(&self) -> u64 {
        self.published + self.skipped + self.failed
    }
}
