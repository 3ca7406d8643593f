//! Inertial Ingestion Loop
//!
//! One blocking transport read per iteration. Each well-formed record is
//! translated onto the wall-clock timeline and appended to the sample
//! sink; everything else is counted and dropped so the loop never stops
//! on transport noise.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use contracts::{InertialSample, InertialTransport, SampleSink, WallClock};
use observability::metrics::{
    record_imu_out_of_order, record_imu_record_malformed, record_imu_sample_ingested,
    record_imu_transport_error,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::anchor::ClockAnchor;
use crate::metrics::{IngestionMetrics, MetricsSnapshot};
use crate::record::parse_record;

/// Result of a single iteration
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Sample appended to the sink
    Appended(InertialSample),
    /// Record discarded by the decoder
    Malformed,
    /// Read timed out without a record
    Idle,
    /// Transport read failed
    TransportError,
}

/// Inertial ingestion loop state
pub struct InertialIngestor {
    transport: Box<dyn InertialTransport>,
    sink: Arc<dyn SampleSink>,
    clock: Arc<dyn WallClock>,
    anchor: Option<ClockAnchor>,
    last_timestamp: Option<f64>,
    metrics: Arc<IngestionMetrics>,
    error_backoff: Duration,
}

impl InertialIngestor {
    /// Create new ingestor
    pub fn new(
        transport: Box<dyn InertialTransport>,
        sink: Arc<dyn SampleSink>,
        clock: Arc<dyn WallClock>,
    ) -> Self {
        Self {
            transport,
            sink,
            clock,
            anchor: None,
            last_timestamp: None,
            metrics: Arc::new(IngestionMetrics::new()),
            error_backoff: Duration::from_millis(10),
        }
    }

    /// Pause after a transport error before the next read
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Share an existing metrics instance
    pub fn with_metrics(mut self, metrics: Arc<IngestionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Clock anchor, once the first record has been decoded
    pub fn anchor(&self) -> Option<ClockAnchor> {
        self.anchor
    }

    /// Run one iteration: read, decode, translate, append
    #[instrument(
        name = "imu_ingest_step",
        level = "trace",
        skip(self),
        fields(source = %self.transport.name())
    )]
    pub fn step(&mut self) -> IngestOutcome {
        let line = match self.transport.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                self.metrics.record_idle();
                return IngestOutcome::Idle;
            }
            Err(e) => {
                self.metrics.record_transport_error();
                record_imu_transport_error(self.transport.name());
                warn!(source = %self.transport.name(), error = %e, "inertial transport read failed");
                return IngestOutcome::TransportError;
            }
        };

        let record = match parse_record(&line) {
            Ok(record) => record,
            Err(e) => {
                self.metrics.record_malformed();
                record_imu_record_malformed();
                trace!(error = %e, line = %line, "discarding malformed inertial record");
                return IngestOutcome::Malformed;
            }
        };

        let anchor = *self.anchor.get_or_insert_with(|| {
            let anchor = ClockAnchor::capture(record.device_us, self.clock.now());
            info!(
                device_t0_us = anchor.device_t0_us(),
                wall_t0 = anchor.wall_t0(),
                "inertial clock anchored"
            );
            anchor
        });

        let timestamp = anchor.to_wall(record.device_us);
        if let Some(last) = self.last_timestamp {
            if timestamp < last {
                self.metrics.record_out_of_order();
                record_imu_out_of_order();
                debug!(timestamp, last, "inertial timestamp went backwards");
            }
        }
        self.last_timestamp = Some(timestamp);

        let sample = InertialSample::from_channels(timestamp, record.channels);
        self.sink.append(sample);
        self.metrics.record_ingested();
        record_imu_sample_ingested();

        IngestOutcome::Appended(sample)
    }

    /// Loop until `shutdown` is set
    ///
    /// Returns the final counters.
    pub fn run(mut self, shutdown: Arc<AtomicBool>) -> MetricsSnapshot {
        info!(source = %self.transport.name(), "inertial ingestion loop started");

        while !shutdown.load(Ordering::Relaxed) {
            if self.step() == IngestOutcome::TransportError {
                std::thread::sleep(self.error_backoff);
            }
        }

        let snapshot = self.metrics.snapshot();
        info!(
            source = %self.transport.name(),
            ingested = snapshot.samples_ingested,
            malformed = snapshot.records_malformed,
            transport_errors = snapshot.transport_errors,
            "inertial ingestion loop stopped"
        );
        snapshot
    }

    /// Run the loop on a dedicated thread
    pub fn spawn(self, shutdown: Arc<AtomicBool>) -> std::io::Result<JoinHandle<MetricsSnapshot>> {
        std::thread::Builder::new()
            .name("imu-ingest".to_string())
            .spawn(move || self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transports::{ScriptedRead, ScriptedTransport};
    use contracts::ManualClock;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        samples: Mutex<Vec<InertialSample>>,
    }

    impl SampleSink for RecordingSink {
        fn append(&self, sample: InertialSample) {
            self.samples.lock().unwrap().push(sample);
        }
    }

    impl RecordingSink {
        fn timestamps(&self) -> Vec<f64> {
            self.samples
                .lock()
                .unwrap()
                .iter()
                .map(|s| s.timestamp)
                .collect()
        }
    }

    fn ingestor(reads: Vec<ScriptedRead>) -> (InertialIngestor, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let clock = Arc::new(ManualClock::new(1000.0));
        let ingestor = InertialIngestor::new(
            Box::new(ScriptedTransport::new(reads)),
            sink.clone(),
            clock,
        );
        (ingestor, sink)
    }

    #[test]
    fn test_first_record_anchors_clock() {
        let (mut ingestor, sink) = ingestor(vec![
            ScriptedRead::line("2000000 0 0 9.81 0 0 0"),
            ScriptedRead::line("2500000 0 0 9.81 0 0 0"),
        ]);

        assert!(matches!(ingestor.step(), IngestOutcome::Appended(_)));
        assert!(matches!(ingestor.step(), IngestOutcome::Appended(_)));

        let ts = sink.timestamps();
        assert_eq!(ts[0], 1000.0);
        assert!((ts[1] - 1000.5).abs() < 1e-9);
        assert_eq!(ingestor.anchor().unwrap().device_t0_us(), 2_000_000.0);
    }

    #[test]
    fn test_malformed_record_is_skipped_and_next_is_appended() {
        let (mut ingestor, sink) = ingestor(vec![
            ScriptedRead::line("1000000 0.1 0.2 9.8 0.0 0.0"),
            ScriptedRead::line("1000000 0.1 0.2 9.8 0.0 0.0 0.3"),
        ]);

        assert_eq!(ingestor.step(), IngestOutcome::Malformed);
        assert!(sink.timestamps().is_empty());

        match ingestor.step() {
            IngestOutcome::Appended(sample) => {
                assert_eq!(sample.timestamp, 1000.0);
                assert_eq!(sample.channels(), [0.1, 0.2, 9.8, 0.0, 0.0, 0.3]);
            }
            other => panic!("expected append, got {other:?}"),
        }
        assert_eq!(sink.timestamps().len(), 1);

        let snap = ingestor.metrics().snapshot();
        assert_eq!(snap.records_malformed, 1);
        assert_eq!(snap.samples_ingested, 1);
    }

    #[test]
    fn test_malformed_first_record_does_not_anchor() {
        let (mut ingestor, _sink) = ingestor(vec![ScriptedRead::line("garbage")]);
        ingestor.step();
        assert!(ingestor.anchor().is_none());
    }

    #[test]
    fn test_transport_error_does_not_stop_ingestion() {
        let (mut ingestor, sink) = ingestor(vec![
            ScriptedRead::error("device reset"),
            ScriptedRead::Idle,
            ScriptedRead::line("10 1 2 3 4 5 6"),
        ]);

        assert_eq!(ingestor.step(), IngestOutcome::TransportError);
        assert_eq!(ingestor.step(), IngestOutcome::Idle);
        assert!(matches!(ingestor.step(), IngestOutcome::Appended(_)));
        assert_eq!(sink.timestamps().len(), 1);

        let snap = ingestor.metrics().snapshot();
        assert_eq!(snap.transport_errors, 1);
        assert_eq!(snap.idle_reads, 1);
    }

    #[test]
    fn test_backwards_timestamp_is_kept_and_counted() {
        let (mut ingestor, sink) = ingestor(vec![
            ScriptedRead::line("2000000 0 0 0 0 0 0"),
            ScriptedRead::line("1000000 0 0 0 0 0 0"),
        ]);
        ingestor.step();
        ingestor.step();

        assert_eq!(sink.timestamps(), vec![1000.0, 999.0]);
        assert_eq!(ingestor.metrics().snapshot().out_of_order, 1);
    }

    #[test]
    fn test_run_stops_on_shutdown() {
        let (ingestor, sink) = ingestor(vec![
            ScriptedRead::line("0 0 0 0 0 0 0"),
            ScriptedRead::line("1000 0 0 0 0 0 0"),
        ]);
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = ingestor.spawn(shutdown.clone()).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while sink.timestamps().len() < 2 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        shutdown.store(true, Ordering::Relaxed);

        let snapshot = handle.join().unwrap();
        assert_eq!(snapshot.samples_ingested, 2);
    }
}
