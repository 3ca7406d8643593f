//! Frame Acquisition Loop
//!
//! One camera read per iteration. A frame that makes it through inference,
//! normalization and encoding becomes a complete [`LatestState`] published
//! with a single pointer swap; any failure on the way abandons the
//! iteration and leaves the previous state visible.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use contracts::{
    CameraFrame, CameraSource, DepthEstimator, DepthMap, LatestState, StationConfig, WallClock,
};
use observability::metrics::{
    record_bundle, record_frame_cycle, record_frame_inference, CycleStatus,
    FusionMetricsAggregator,
};
use publisher::{encode_jpeg, LatestStateSlot};
use tracing::{debug, info, instrument, warn};

use crate::buffer::{BundleHistory, InertialRingBuffer};
use crate::depth::{depth_to_distance, prepare_input, DistanceRange};
use crate::error::{Result, SyncError};
use crate::metrics::FrameLoopMetrics;
use crate::window::synchronize;

/// Frame loop parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLoopConfig {
    /// Loop period
    pub period: Duration,
    /// Trailing inertial window (seconds)
    pub window_s: f64,
    /// JPEG quality of the published frame
    pub jpeg_quality: u8,
    /// Depth → distance mapping
    pub range: DistanceRange,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self::from_station(&StationConfig::default())
    }
}

impl FrameLoopConfig {
    pub fn from_station(config: &StationConfig) -> Self {
        Self {
            period: config.camera.period(),
            window_s: config.sync.window_s,
            jpeg_quality: config.camera.jpeg_quality,
            range: DistanceRange::from(&config.depth),
        }
    }
}

/// Result of one frame cycle
#[derive(Debug)]
pub enum CycleOutcome {
    /// A complete state was published
    Published {
        cycle: u64,
        frame_timestamp: f64,
        samples: usize,
    },
    /// No frame this time; nothing changed
    Skipped(SyncError),
    /// Inference or encoding failed; the previous state stays visible
    Failed(SyncError),
}

impl CycleOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

/// Frame loop state
pub struct FrameSynchronizer {
    camera: Box<dyn CameraSource>,
    estimator: Box<dyn DepthEstimator>,
    buffer: Arc<InertialRingBuffer>,
    history: Arc<BundleHistory>,
    slot: Arc<LatestStateSlot>,
    clock: Arc<dyn WallClock>,
    config: FrameLoopConfig,
    metrics: Arc<FrameLoopMetrics>,
    aggregator: FusionMetricsAggregator,
    cycle: u64,
}

impl FrameSynchronizer {
    /// Create new frame loop
    pub fn new(
        camera: Box<dyn CameraSource>,
        estimator: Box<dyn DepthEstimator>,
        buffer: Arc<InertialRingBuffer>,
        history: Arc<BundleHistory>,
        slot: Arc<LatestStateSlot>,
        clock: Arc<dyn WallClock>,
    ) -> Self {
        Self {
            camera,
            estimator,
            buffer,
            history,
            slot,
            clock,
            config: FrameLoopConfig::default(),
            metrics: Arc::new(FrameLoopMetrics::new()),
            aggregator: FusionMetricsAggregator::new(),
            cycle: 0,
        }
    }

    pub fn with_config(mut self, config: FrameLoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing metrics instance
    pub fn with_metrics(mut self, metrics: Arc<FrameLoopMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<FrameLoopMetrics> {
        self.metrics.clone()
    }

    /// In-memory statistics gathered so far
    pub fn aggregator(&self) -> &FusionMetricsAggregator {
        &self.aggregator
    }

    /// Run one iteration: acquire, infer, convert, window, publish
    #[instrument(
        name = "frame_cycle",
        level = "debug",
        skip(self),
        fields(camera = %self.camera.name(), next_cycle = self.cycle + 1)
    )]
    pub fn cycle(&mut self) -> CycleOutcome {
        let started = Instant::now();

        match self.build_state() {
            Ok((state, inference_s)) => {
                let cycle = state.cycle;
                let frame_timestamp = state.frame_timestamp();
                let samples = state.bundle.len();
                let bundle = state.bundle.clone();

                self.slot.publish(state);
                let depth = self.history.push(bundle);
                self.cycle = cycle;

                let cycle_s = started.elapsed().as_secs_f64();
                record_frame_inference(inference_s);
                record_bundle(samples, depth);
                record_frame_cycle(CycleStatus::Published, cycle_s);
                self.metrics.record_published(frame_timestamp);
                self.aggregator
                    .record_published(samples, inference_s, cycle_s);

                debug!(cycle, frame_timestamp, samples, "frame state published");
                CycleOutcome::Published {
                    cycle,
                    frame_timestamp,
                    samples,
                }
            }
            Err(e) if e.is_skip() => {
                record_frame_cycle(CycleStatus::Skipped, started.elapsed().as_secs_f64());
                self.metrics.record_skipped();
                self.aggregator.record_skipped();
                debug!(reason = %e, "frame cycle skipped");
                CycleOutcome::Skipped(e)
            }
            Err(e) => {
                record_frame_cycle(CycleStatus::Failed, started.elapsed().as_secs_f64());
                self.metrics.record_failed();
                self.aggregator.record_failed();
                warn!(error = %e, "frame cycle abandoned, keeping previous state");
                CycleOutcome::Failed(e)
            }
        }
    }

    /// Build the next state without touching anything shared but the
    /// inertial buffer snapshot
    fn build_state(&mut self) -> Result<(LatestState, f64)> {
        let (frame, frame_timestamp) = self.acquire()?;

        let inference_started = Instant::now();
        let raw = self.infer(&frame)?;
        let inference_s = inference_started.elapsed().as_secs_f64();

        let distance = depth_to_distance(&raw, &self.config.range);
        let encoded = encode_jpeg(&frame, self.config.jpeg_quality).map_err(SyncError::Encoding)?;

        let snapshot = self.buffer.snapshot();
        let bundle = synchronize(frame_timestamp, &snapshot, self.config.window_s);

        let state = LatestState {
            cycle: self.cycle + 1,
            encoded_frame: encoded,
            distance_map: Arc::new(distance),
            bundle: Arc::new(bundle),
        };
        Ok((state, inference_s))
    }

    /// Read one frame and stamp it at the moment of acquisition
    fn acquire(&mut self) -> Result<(CameraFrame, f64)> {
        match self.camera.read_frame() {
            Ok(Some(frame)) => Ok((frame, self.clock.now())),
            Ok(None) => Err(SyncError::NoFrame),
            Err(e) => Err(SyncError::Camera(e)),
        }
    }

    /// Resize to the model input and run the estimator
    ///
    /// A panicking model is contained here and reported as an inference
    /// failure.
    fn infer(&mut self, frame: &CameraFrame) -> Result<DepthMap> {
        let size = self.estimator.input_size();
        let input = prepare_input(frame, size).map_err(|e| SyncError::inference(e.to_string()))?;

        let estimator = &mut self.estimator;
        let raw = panic::catch_unwind(AssertUnwindSafe(|| estimator.estimate_depth(&input)))
            .map_err(|payload| SyncError::inference(panic_message(payload.as_ref())))?
            .map_err(|e| SyncError::inference(e.to_string()))?;

        if raw.dimensions() != size {
            return Err(SyncError::ShapeMismatch {
                expected: size,
                actual: raw.dimensions(),
            });
        }
        Ok(raw)
    }

    /// Loop until `shutdown` is set
    ///
    /// Skipped cycles retry immediately; every other cycle sleeps the
    /// remainder of the period.
    pub fn run(mut self, shutdown: Arc<AtomicBool>) -> FusionMetricsAggregator {
        info!(
            camera = %self.camera.name(),
            model = %self.estimator.name(),
            period_ms = self.config.period.as_secs_f64() * 1000.0,
            window_s = self.config.window_s,
            "frame loop started"
        );

        while !shutdown.load(Ordering::Relaxed) {
            let started = Instant::now();
            if let CycleOutcome::Skipped(_) = self.cycle() {
                continue;
            }
            if let Some(remaining) = self.config.period.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }

        info!(
            camera = %self.camera.name(),
            published = self.aggregator.published,
            skipped = self.aggregator.skipped,
            failed = self.aggregator.failed,
            "frame loop stopped"
        );
        self.aggregator
    }

    /// Run the loop on a dedicated thread
    pub fn spawn(
        self,
        shutdown: Arc<AtomicBool>,
    ) -> std::io::Result<JoinHandle<FusionMetricsAggregator>> {
        std::thread::Builder::new()
            .name("frame-loop".to_string())
            .spawn(move || self.run(shutdown))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("model panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("model panicked: {s}")
    } else {
        "model panicked".to_string()
    }
}
