//! Frame/inertial windowing rule.
//!
//! A sample belongs to a frame at `T` iff `0 < T - s.timestamp < window`:
//! strictly before the frame and strictly younger than the window.
//! Only timestamps matter, so the rule holds for any buffer order.

use contracts::{InertialSample, SynchronizedBundle};

/// Whether a sample at `sample_ts` is associated with a frame at `frame_ts`
#[inline]
pub fn in_window(frame_ts: f64, sample_ts: f64, window: f64) -> bool {
    let dt = frame_ts - sample_ts;
    dt > 0.0 && dt < window
}

/// Samples associated with a frame, in snapshot order
pub fn window_samples(
    frame_ts: f64,
    samples: &[InertialSample],
    window: f64,
) -> Vec<InertialSample> {
    samples
        .iter()
        .filter(|s| in_window(frame_ts, s.timestamp, window))
        .copied()
        .collect()
}

/// Build the bundle for a frame from a buffer snapshot
pub fn synchronize(frame_ts: f64, snapshot: &[InertialSample], window: f64) -> SynchronizedBundle {
    SynchronizedBundle {
        frame_timestamp: frame_ts,
        samples: window_samples(frame_ts, snapshot, window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(stamps: &[f64]) -> Vec<InertialSample> {
        stamps
            .iter()
            .map(|&ts| InertialSample::from_channels(ts, [0.0; 6]))
            .collect()
    }

    fn stamps(bundle: &SynchronizedBundle) -> Vec<f64> {
        bundle.samples.iter().map(|s| s.timestamp).collect()
    }

    #[test]
    fn test_window_excludes_both_edges() {
        let snapshot = samples(&[98.9, 99.2, 99.9, 100.0, 100.1]);
        let bundle = synchronize(100.0, &snapshot, 1.0);
        assert_eq!(stamps(&bundle), vec![99.2, 99.9]);
        assert_eq!(bundle.frame_timestamp, 100.0);
    }

    #[test]
    fn test_sample_exactly_window_old_is_excluded() {
        assert!(!in_window(10.0, 9.0, 1.0));
        assert!(in_window(10.0, 9.000_001, 1.0));
    }

    #[test]
    fn test_unordered_snapshot_keeps_snapshot_order() {
        let snapshot = samples(&[99.9, 99.5, 99.7]);
        let bundle = synchronize(100.0, &snapshot, 1.0);
        assert_eq!(stamps(&bundle), vec![99.9, 99.5, 99.7]);
    }

    #[test]
    fn test_empty_snapshot_gives_empty_bundle() {
        let bundle = synchronize(5.0, &[], 1.0);
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_every_sample_satisfies_invariant() {
        let snapshot: Vec<_> = samples(&(0..400).map(|i| 98.0 + i as f64 * 0.01).collect::<Vec<_>>());
        let bundle = synchronize(100.0, &snapshot, 1.0);
        assert!(!bundle.is_empty());
        for s in &bundle.samples {
            let dt = bundle.frame_timestamp - s.timestamp;
            assert!(dt > 0.0 && dt < 1.0, "sample at {} violates window", s.timestamp);
        }
    }
}
