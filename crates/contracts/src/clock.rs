//! Wall-clock abstraction
//!
//! Every timestamp leaving the acquisition loops lives on this timeline
//! (seconds since the Unix epoch, `f64`).

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Source of wall-clock time
pub trait WallClock: Send + Sync {
    /// Current time in seconds since the Unix epoch
    fn now(&self) -> f64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> f64 {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}

/// Manually driven clock
///
/// Used by tests and replays that need deterministic timestamps.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, t: f64) {
        self.bits.store(t.to_bits(), Ordering::SeqCst);
    }

    /// Move forward by `dt` seconds
    pub fn advance(&self, dt: f64) {
        let _ = self
            .bits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |bits| {
                Some((f64::from_bits(bits) + dt).to_bits())
            });
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
