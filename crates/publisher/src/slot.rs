//! Latest-state slot
//!
//! Holds `Option<Arc<LatestState>>` behind an `ArcSwapOption`. The frame
//! loop builds a complete immutable state and swaps the pointer; readers
//! load a pointer and keep a consistent state for as long as they hold it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use contracts::LatestState;
use tracing::trace;

/// Single-slot published state
#[derive(Debug, Default)]
pub struct LatestStateSlot {
    current: ArcSwapOption<LatestState>,
    publishes: AtomicU64,
}

impl LatestStateSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published state wholesale
    pub fn publish(&self, state: LatestState) -> Arc<LatestState> {
        let state = Arc::new(state);
        self.current.store(Some(state.clone()));
        let count = self.publishes.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(cycle = state.cycle, publishes = count, "latest state published");
        state
    }

    /// Current state, `None` until the first publish
    pub fn load(&self) -> Option<Arc<LatestState>> {
        self.current.load_full()
    }

    pub fn is_published(&self) -> bool {
        self.current.load().is_some()
    }

    /// Number of publishes so far
    pub fn publish_count(&self) -> u64 {
        self.publishes.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::{EncodedFrame, Grid, SynchronizedBundle};
    use std::sync::atomic::AtomicBool;

    fn state(cycle: u64) -> LatestState {
        let tag = cycle as f32;
        LatestState {
            cycle,
            encoded_frame: EncodedFrame {
                width: 2,
                height: 1,
                data: Bytes::from(cycle.to_le_bytes().to_vec()),
            },
            distance_map: Arc::new(Grid::filled(2, 1, tag).unwrap()),
            bundle: Arc::new(SynchronizedBundle {
                frame_timestamp: cycle as f64,
                samples: Vec::new(),
            }),
        }
    }

    #[test]
    fn test_empty_until_first_publish() {
        let slot = LatestStateSlot::new();
        assert!(slot.load().is_none());
        assert!(!slot.is_published());

        slot.publish(state(1));
        assert!(slot.is_published());
        assert_eq!(slot.load().unwrap().cycle, 1);
        assert_eq!(slot.publish_count(), 1);
    }

    #[test]
    fn test_reader_keeps_its_snapshot_across_publish() {
        let slot = LatestStateSlot::new();
        slot.publish(state(1));
        let held = slot.load().unwrap();
        slot.publish(state(2));

        assert_eq!(held.cycle, 1);
        assert_eq!(held.bundle.frame_timestamp, 1.0);
        assert_eq!(slot.load().unwrap().cycle, 2);
    }

    #[test]
    fn test_concurrent_readers_never_see_mixed_cycles() {
        let slot = Arc::new(LatestStateSlot::new());
        let stop = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let slot = slot.clone();
                let stop = stop.clone();
                std::thread::spawn(move || {
                    let mut observed = 0u64;
                    while !stop.load(Ordering::Relaxed) {
                        if let Some(s) = slot.load() {
                            let frame_cycle =
                                u64::from_le_bytes(s.encoded_frame.data[..8].try_into().unwrap());
                            assert_eq!(frame_cycle, s.cycle);
                            assert_eq!(s.distance_map.values()[0], s.cycle as f32);
                            assert_eq!(s.bundle.frame_timestamp, s.cycle as f64);
                            observed += 1;
                        }
                    }
                    observed
                })
            })
            .collect();

        for cycle in 1..=2000 {
            slot.publish(state(cycle));
        }
        stop.store(true, Ordering::Relaxed);

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(slot.load().unwrap().cycle, 2000);
    }
}
