//! Read-only query operations over the shared acquisition state
//!
//! Every operation is a pointer load or a short copy under the owning
//! structure's lock; nothing waits for the next frame or sample.

use std::sync::Arc;

use bytes::Bytes;
use contracts::{DistanceMap, EncodedFrame};
use ingestion::IngestionMetrics;
use publisher::{
    encode_distance_png, BundleHistoryRecord, BundleRecord, LatestStateSlot, RawBufferRecord,
};
use serde::{Deserialize, Serialize};
use sync_engine::{BundleHistory, FrameLoopMetrics, InertialRingBuffer};

use crate::error::{QueryError, Result};

/// Counters and depths reported by `/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub samples_ingested: u64,
    pub records_malformed: u64,
    pub transport_errors: u64,
    pub out_of_order: u64,
    pub frames_published: u64,
    pub frames_skipped: u64,
    pub frames_failed: u64,
    pub buffer_depth: usize,
    pub buffer_capacity: usize,
    pub history_depth: usize,
    pub history_capacity: usize,
    pub published: bool,
    pub last_frame_timestamp: Option<f64>,
}

/// Handle on the shared state, cheap to clone into request handlers
#[derive(Clone)]
pub struct QueryService {
    slot: Arc<LatestStateSlot>,
    buffer: Arc<InertialRingBuffer>,
    history: Arc<BundleHistory>,
    ingestion_metrics: Arc<IngestionMetrics>,
    frame_metrics: Arc<FrameLoopMetrics>,
}

impl QueryService {
    pub fn new(
        slot: Arc<LatestStateSlot>,
        buffer: Arc<InertialRingBuffer>,
        history: Arc<BundleHistory>,
    ) -> Self {
        Self {
            slot,
            buffer,
            history,
            ingestion_metrics: Arc::new(IngestionMetrics::new()),
            frame_metrics: Arc::new(FrameLoopMetrics::new()),
        }
    }

    /// Report the ingestion loop's counters in `status()`
    pub fn with_ingestion_metrics(mut self, metrics: Arc<IngestionMetrics>) -> Self {
        self.ingestion_metrics = metrics;
        self
    }

    /// Report the frame loop's counters in `status()`
    pub fn with_frame_metrics(mut self, metrics: Arc<FrameLoopMetrics>) -> Self {
        self.frame_metrics = metrics;
        self
    }

    /// Most recent encoded frame
    pub fn current_frame(&self) -> Result<EncodedFrame> {
        self.slot
            .load()
            .map(|state| state.encoded_frame.clone())
            .ok_or(QueryError::Unavailable("frame"))
    }

    /// Most recent distance map (metres)
    pub fn current_distance_map(&self) -> Result<Arc<DistanceMap>> {
        self.slot
            .load()
            .map(|state| state.distance_map.clone())
            .ok_or(QueryError::Unavailable("distance map"))
    }

    /// Most recent distance map as a 16-bit millimetre PNG
    pub fn current_distance_png(&self) -> Result<Bytes> {
        let map = self.current_distance_map()?;
        Ok(encode_distance_png(&map)?)
    }

    /// Most recent bundle, or the empty record before the first frame
    pub fn latest_bundle(&self) -> BundleRecord {
        self.slot
            .load()
            .map(|state| BundleRecord::from(state.bundle.as_ref()))
            .unwrap_or_else(BundleRecord::empty)
    }

    /// Full inertial buffer, unfiltered, arrival order
    pub fn raw_buffer(&self) -> RawBufferRecord {
        RawBufferRecord {
            samples: self.buffer.snapshot(),
        }
    }

    /// Newest `limit` bundles, oldest first
    pub fn recent_bundles(&self, limit: usize) -> BundleHistoryRecord {
        BundleHistoryRecord {
            bundles: self
                .history
                .recent(limit)
                .iter()
                .map(|bundle| BundleRecord::from(bundle.as_ref()))
                .collect(),
        }
    }

    pub fn history_capacity(&self) -> usize {
        self.history.capacity()
    }

    pub fn status(&self) -> StatusRecord {
        let ingest = self.ingestion_metrics.snapshot();
        let frames = self.frame_metrics.snapshot();
        let state = self.slot.load();

        StatusRecord {
            samples_ingested: ingest.samples_ingested,
            records_malformed: ingest.records_malformed,
            transport_errors: ingest.transport_errors,
            out_of_order: ingest.out_of_order,
            frames_published: frames.published,
            frames_skipped: frames.skipped,
            frames_failed: frames.failed,
            buffer_depth: self.buffer.len(),
            buffer_capacity: self.buffer.capacity(),
            history_depth: self.history.len(),
            history_capacity: self.history.capacity(),
            published: state.is_some(),
            last_frame_timestamp: state.map(|s| s.frame_timestamp()),
        }
    }
}
