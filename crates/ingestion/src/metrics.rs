//! Ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion loop counters
///
/// Shared between the loop thread and status readers.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Samples appended to the buffer
    pub samples_ingested: AtomicU64,

    /// Records discarded by the decoder
    pub records_malformed: AtomicU64,

    /// Transport read failures
    pub transport_errors: AtomicU64,

    /// Reads that timed out without a record
    pub idle_reads: AtomicU64,

    /// Samples whose timestamp is older than their predecessor
    pub out_of_order: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record sample appended
    pub fn record_ingested(&self) {
        self.samples_ingested.fetch_add(1, Ordering::Relaxed);
    }

    /// Record malformed record
    pub fn record_malformed(&self) {
        self.records_malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record transport error
    pub fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record empty read
    pub fn record_idle(&self) {
        self.idle_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Record timestamp regression
    pub fn record_out_of_order(&self) {
        self.out_of_order.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            records_malformed: self.records_malformed.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            idle_reads: self.idle_reads.load(Ordering::Relaxed),
            out_of_order: self.out_of_order.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub samples_ingested: u64,
    pub records_malformed: u64,
    pub transport_errors: u64,
    pub idle_reads: u64,
    pub out_of_order: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = IngestionMetrics::new();
        metrics.record_ingested();
        metrics.record_ingested();
        metrics.record_malformed();
        metrics.record_out_of_order();

        let snap = metrics.snapshot();
        assert_eq!(snap.samples_ingested, 2);
        assert_eq!(snap.records_malformed, 1);
        assert_eq!(snap.transport_errors, 0);
        assert_eq!(snap.out_of_order, 1);
    }
}
