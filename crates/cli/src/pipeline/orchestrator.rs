//! Station orchestrator - wires the loops, shared state and query server.
//!
//! Two worker threads (inertial ingestion, frame acquisition) and the HTTP
//! server on the tokio runtime share three structures: the inertial ring
//! buffer, the bundle history and the latest-state slot. Shutdown flips a
//! shared flag that both loops check once per iteration.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use contracts::{StationConfig, SystemClock, WallClock};
use ingestion::{InertialIngestor, MetricsSnapshot};
use observability::FusionMetricsAggregator;
use publisher::LatestStateSlot;
use query::QueryService;
use sync_engine::{
    BundleHistory, FrameLoopConfig, FrameLoopMetrics, FrameSynchronizer, InertialRingBuffer,
    LuminanceDepthEstimator,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::PipelineStats;

/// How often `--max-frames` is checked
const FRAME_LIMIT_POLL: Duration = Duration::from_millis(50);

/// Grace period for in-flight HTTP requests
const SERVER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Station configuration (already validated)
    pub station: StationConfig,

    /// Stop after this many published frames (None = unlimited)
    pub max_frames: Option<u64>,

    /// Stop after this long (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Why the station stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// Ctrl+C / SIGTERM
    #[default]
    Signal,
    /// `--max-frames` reached
    FrameLimit,
    /// `--timeout` elapsed
    Timeout,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal => write!(f, "signal"),
            Self::FrameLimit => write!(f, "frame limit"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Main station orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until `signal` resolves or a run limit is hit
    ///
    /// Device, camera and bind failures are fatal and surface before any
    /// loop starts.
    pub async fn run<S>(self, signal: S) -> Result<PipelineStats>
    where
        S: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let station = &self.config.station;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Open everything fallible first
        let transport = ingestion::open_transport(&station.imu).with_context(|| {
            format!("Failed to open inertial transport ({:?})", station.imu.source)
        })?;
        let camera = ingestion::open_camera(&station.camera).with_context(|| {
            format!("Failed to open camera ({:?})", station.camera.source)
        })?;
        let listener = TcpListener::bind(&station.server.bind)
            .await
            .with_context(|| format!("Failed to bind query server to {}", station.server.bind))?;

        info!(
            transport = %transport.name(),
            camera = %camera.name(),
            "Devices opened"
        );

        // Shared state
        let buffer = Arc::new(InertialRingBuffer::new(station.imu.buffer_capacity));
        let history = Arc::new(BundleHistory::new(station.sync.history_capacity));
        let slot = Arc::new(LatestStateSlot::new());
        let clock: Arc<dyn WallClock> = Arc::new(SystemClock);
        let shutdown = Arc::new(AtomicBool::new(false));

        let ingestor = InertialIngestor::new(transport, buffer.clone(), clock.clone())
            .with_error_backoff(station.imu.error_backoff());
        let ingestion_metrics = ingestor.metrics();

        let frame_loop = FrameSynchronizer::new(
            camera,
            Box::new(LuminanceDepthEstimator::from(&station.depth)),
            buffer.clone(),
            history.clone(),
            slot.clone(),
            clock,
        )
        .with_config(FrameLoopConfig::from_station(station));
        let frame_metrics = frame_loop.metrics();

        let ingest_handle = ingestor
            .spawn(shutdown.clone())
            .context("Failed to spawn inertial ingestion thread")?;
        let frame_handle = match frame_loop.spawn(shutdown.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                shutdown.store(true, Ordering::Relaxed);
                let _ = join_worker(ingest_handle, "imu-ingest").await;
                return Err(e).context("Failed to spawn frame loop thread");
            }
        };

        let service = QueryService::new(slot, buffer, history)
            .with_ingestion_metrics(ingestion_metrics)
            .with_frame_metrics(frame_metrics.clone());
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(query::serve(listener, service, async move {
            let _ = stop_rx.await;
        }));

        info!(
            max_frames = ?self.config.max_frames,
            timeout = ?self.config.timeout,
            "Station running"
        );

        let stop_reason = self.wait_for_stop(&frame_metrics, signal).await;
        info!(reason = %stop_reason, "Shutting down station...");

        shutdown.store(true, Ordering::Relaxed);
        let _ = stop_tx.send(());

        match tokio::time::timeout(SERVER_DRAIN_TIMEOUT, server).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => warn!(error = %e, "Query server error"),
            Ok(Err(e)) => warn!(error = %e, "Query server task failed"),
            Err(_) => warn!("Query server did not drain in time"),
        }

        let ingestion: MetricsSnapshot = join_worker(ingest_handle, "imu-ingest").await?;
        let fusion: FusionMetricsAggregator = join_worker(frame_handle, "frame-loop").await?;

        let stats = PipelineStats {
            duration: start_time.elapsed(),
            stop_reason,
            ingestion,
            fusion,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Station shutdown complete"
        );

        Ok(stats)
    }

    /// First of: external signal, frame limit, timeout
    async fn wait_for_stop<S>(&self, frame_metrics: &FrameLoopMetrics, signal: S) -> StopReason
    where
        S: Future<Output = ()>,
    {
        let max_frames = self.config.max_frames;
        let frame_limit = async {
            match max_frames {
                Some(max) => {
                    let mut tick = tokio::time::interval(FRAME_LIMIT_POLL);
                    loop {
                        tick.tick().await;
                        if frame_metrics.published() >= max {
                            info!(frames = max, "Reached max frames limit");
                            break;
                        }
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        let timeout = self.config.timeout;
        let deadline = async {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = signal => StopReason::Signal,
            _ = frame_limit => StopReason::FrameLimit,
            _ = deadline => {
                warn!(timeout_secs = timeout.map(|t| t.as_secs()), "Station timed out");
                StopReason::Timeout
            }
        }
    }
}

/// Join a worker thread without blocking the async runtime
async fn join_worker<T: Send + 'static>(handle: JoinHandle<T>, name: &str) -> Result<T> {
    tokio::task::spawn_blocking(move || handle.join())
        .await
        .with_context(|| format!("Failed to join {name} thread"))?
        .map_err(|_| anyhow!("{name} thread panicked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_frames: Option<u64>, timeout: Option<Duration>) -> PipelineConfig {
        let mut station = StationConfig::default();
        station.server.bind = "127.0.0.1:0".to_string();
        station.camera.width = 32;
        station.camera.height = 24;
        station.camera.frame_rate_hz = 100.0;
        station.depth.input_width = 16;
        station.depth.input_height = 16;
        station.imu.mock_rate_hz = 500.0;
        PipelineConfig {
            station,
            max_frames,
            timeout,
            metrics_port: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_stops_at_frame_limit() {
        let stats = Pipeline::new(config(Some(3), Some(Duration::from_secs(10))))
            .run(std::future::pending::<()>())
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::FrameLimit);
        assert!(stats.frames_published() >= 3);
        assert!(stats.ingestion.samples_ingested > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_stops_on_signal() {
        let stats = Pipeline::new(config(None, None))
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();
        assert_eq!(stats.stop_reason, StopReason::Signal);
    }

    #[tokio::test]
    async fn test_bad_serial_port_is_fatal() {
        let mut config = config(None, None);
        config.station.imu.source = contracts::ImuSourceKind::Serial;
        config.station.imu.port = "/dev/does-not-exist-imu".to_string();

        let err = Pipeline::new(config)
            .run(std::future::pending::<()>())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("inertial transport"));
    }
}
