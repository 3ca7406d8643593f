//! Bounded FIFO buffers shared between the acquisition loops.
//!
//! Both buffers sit on a fixed-capacity `HeapRb`; pushing into a full ring
//! overwrites the oldest element, so memory stays constant regardless of
//! how long the process runs.
//!
//! - [`InertialRingBuffer`]: one writer (ingestion), many readers via
//!   copy-out snapshots
//! - [`BundleHistory`]: one writer (frame loop), many readers

use std::fmt;
use std::sync::Arc;

use contracts::{InertialSample, SampleSink, SynchronizedBundle};
use observability::metrics::record_imu_buffer_depth;
use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};

/// Fixed-capacity FIFO with oldest-first eviction
pub struct BoundedFifo<T> {
    ring: HeapRb<T>,
    evicted: u64,
}

impl<T> fmt::Debug for BoundedFifo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedFifo")
            .field("len", &self.ring.occupied_len())
            .field("capacity", &self.capacity())
            .field("evicted", &self.evicted)
            .finish()
    }
}

impl<T> BoundedFifo<T> {
    /// Create a FIFO holding at most `capacity` elements (minimum 1)
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: HeapRb::new(capacity.max(1)),
            evicted: 0,
        }
    }

    /// Push to the back, evicting the front when full
    ///
    /// Returns the evicted element, if any.
    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = self.ring.push_overwrite(item);
        if evicted.is_some() {
            self.evicted += 1;
        }
        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity().get()
    }

    /// Elements evicted since creation
    #[inline]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.ring.iter()
    }
}

impl<T: Clone> BoundedFifo<T> {
    /// Copy out all elements, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.ring.iter().cloned().collect()
    }

    /// Copy out the newest `n` elements, oldest first
    pub fn newest(&self, n: usize) -> Vec<T> {
        let skip = self.len().saturating_sub(n);
        self.ring.iter().skip(skip).cloned().collect()
    }
}

/// Inertial sample ring buffer
///
/// Every access takes the lock for the duration of a single push or copy;
/// no caller ever holds it across I/O or inference.
#[derive(Debug)]
pub struct InertialRingBuffer {
    inner: Mutex<BoundedFifo<InertialSample>>,
}

impl InertialRingBuffer {
    /// Create a buffer with capacity `C_imu`
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BoundedFifo::new(capacity)),
        }
    }

    /// Append a sample, evicting the oldest when full. O(1).
    pub fn append(&self, sample: InertialSample) {
        let depth = {
            let mut fifo = self.inner.lock();
            fifo.push(sample);
            fifo.len()
        };
        record_imu_buffer_depth(depth);
    }

    /// Copy of the current contents in arrival order
    pub fn snapshot(&self) -> Vec<InertialSample> {
        self.inner.lock().to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Samples evicted since creation
    pub fn evicted(&self) -> u64 {
        self.inner.lock().evicted()
    }
}

impl SampleSink for InertialRingBuffer {
    fn append(&self, sample: InertialSample) {
        InertialRingBuffer::append(self, sample);
    }
}

/// Synchronized bundle history with capacity `C_hist`
#[derive(Debug)]
pub struct BundleHistory {
    inner: Mutex<BoundedFifo<Arc<SynchronizedBundle>>>,
}

impl BundleHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BoundedFifo::new(capacity)),
        }
    }

    /// Append a bundle, evicting the oldest when full
    ///
    /// Returns the history depth after the push.
    pub fn push(&self, bundle: Arc<SynchronizedBundle>) -> usize {
        let mut fifo = self.inner.lock();
        fifo.push(bundle);
        fifo.len()
    }

    /// Newest `limit` bundles, oldest first
    pub fn recent(&self, limit: usize) -> Vec<Arc<SynchronizedBundle>> {
        self.inner.lock().newest(limit)
    }

    /// All bundles, oldest first
    pub fn snapshot(&self) -> Vec<Arc<SynchronizedBundle>> {
        self.inner.lock().to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: f64) -> InertialSample {
        InertialSample::from_channels(ts, [0.0; 6])
    }

    fn timestamps(samples: &[InertialSample]) -> Vec<f64> {
        samples.iter().map(|s| s.timestamp).collect()
    }

    #[test]
    fn test_fifo_evicts_oldest() {
        let mut fifo = BoundedFifo::new(3);
        assert_eq!(fifo.push(1), None);
        assert_eq!(fifo.push(2), None);
        assert_eq!(fifo.push(3), None);
        assert_eq!(fifo.push(4), Some(1));
        assert_eq!(fifo.to_vec(), vec![2, 3, 4]);
        assert_eq!(fifo.evicted(), 1);
        assert_eq!(fifo.capacity(), 3);
    }

    #[test]
    fn test_fifo_newest() {
        let mut fifo = BoundedFifo::new(5);
        for i in 0..5 {
            fifo.push(i);
        }
        assert_eq!(fifo.newest(2), vec![3, 4]);
        assert_eq!(fifo.newest(10), vec![0, 1, 2, 3, 4]);
        assert!(fifo.newest(0).is_empty());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let fifo: BoundedFifo<u8> = BoundedFifo::new(0);
        assert_eq!(fifo.capacity(), 1);
    }

    #[test]
    fn test_ring_buffer_capacity_three() {
        let buffer = InertialRingBuffer::new(3);
        for ts in [1.0, 2.0, 3.0, 4.0] {
            buffer.append(sample(ts));
        }
        assert_eq!(timestamps(&buffer.snapshot()), vec![2.0, 3.0, 4.0]);
        assert_eq!(buffer.evicted(), 1);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let buffer = InertialRingBuffer::new(10);
        buffer.append(sample(1.0));
        let snap = buffer.snapshot();
        buffer.append(sample(2.0));

        assert_eq!(timestamps(&snap), vec![1.0]);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_arrival_order_preserved() {
        let buffer = InertialRingBuffer::new(10);
        for ts in [5.0, 3.0, 4.0] {
            buffer.append(sample(ts));
        }
        assert_eq!(timestamps(&buffer.snapshot()), vec![5.0, 3.0, 4.0]);
    }

    #[test]
    fn test_ring_buffer_as_sample_sink() {
        let buffer = Arc::new(InertialRingBuffer::new(4));
        let sink: Arc<dyn SampleSink> = buffer.clone();
        sink.append(sample(7.0));
        assert_eq!(timestamps(&buffer.snapshot()), vec![7.0]);
    }

    #[test]
    fn test_concurrent_writer_and_readers() {
        let buffer = Arc::new(InertialRingBuffer::new(100));
        let writer = {
            let buffer = buffer.clone();
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    buffer.append(sample(i as f64));
                }
            })
        };
        let reader = {
            let buffer = buffer.clone();
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    let snap = buffer.snapshot();
                    assert!(snap.len() <= 100);
                    // a copy is always a contiguous, increasing run
                    assert!(snap.windows(2).all(|w| w[1].timestamp == w[0].timestamp + 1.0));
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(buffer.len(), 100);
        assert_eq!(buffer.snapshot()[99].timestamp, 9_999.0);
    }

    #[test]
    fn test_bundle_history_bounded() {
        let history = BundleHistory::new(2);
        for ts in [1.0, 2.0, 3.0] {
            history.push(Arc::new(SynchronizedBundle {
                frame_timestamp: ts,
                samples: Vec::new(),
            }));
        }
        let stamps: Vec<f64> = history
            .snapshot()
            .iter()
            .map(|b| b.frame_timestamp)
            .collect();
        assert_eq!(stamps, vec![2.0, 3.0]);
        assert_eq!(history.recent(1)[0].frame_timestamp, 3.0);
        assert_eq!(history.capacity(), 2);
    }
}
