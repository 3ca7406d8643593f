//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 → 运行参数的贯通测试
//! - 回放文件 → 采集循环 → 帧循环 → 查询接口 (确定性时钟)
//! - Mock 传感器 → 双线程循环 → 查询接口 (真实时钟)

/// Shared fixtures
#[cfg(test)]
mod support {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use publisher::LatestStateSlot;
    use query::QueryService;
    use serde_json::Value;
    use sync_engine::{BundleHistory, InertialRingBuffer};
    use tower::ServiceExt;

    pub struct SharedState {
        pub buffer: Arc<InertialRingBuffer>,
        pub history: Arc<BundleHistory>,
        pub slot: Arc<LatestStateSlot>,
    }

    impl SharedState {
        pub fn new(buffer_capacity: usize, history_capacity: usize) -> Self {
            Self {
                buffer: Arc::new(InertialRingBuffer::new(buffer_capacity)),
                history: Arc::new(BundleHistory::new(history_capacity)),
                slot: Arc::new(LatestStateSlot::new()),
            }
        }

        pub fn service(&self) -> QueryService {
            QueryService::new(self.slot.clone(), self.buffer.clone(), self.history.clone())
        }
    }

    /// GET through the router in-process
    pub async fn get(service: QueryService, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = query::router(service)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    pub async fn get_json(service: QueryService, uri: &str) -> Value {
        let (status, body) = get(service, uri).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}");
        serde_json::from_slice(&body).unwrap()
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use sync_engine::{DistanceRange, FrameLoopConfig};

    #[test]
    fn test_station_document_drives_frame_loop() {
        let content = r#"
[camera]
frame_rate_hz = 20.0
jpeg_quality = 75

[depth]
min_distance_m = 0.5
max_distance_m = 10.0

[sync]
window_s = 0.25
"#;
        let station = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        let loop_config = FrameLoopConfig::from_station(&station);

        assert!((loop_config.period.as_secs_f64() - 0.05).abs() < 1e-9);
        assert_eq!(loop_config.window_s, 0.25);
        assert_eq!(loop_config.jpeg_quality, 75);
        assert_eq!(
            loop_config.range,
            DistanceRange {
                min_m: 0.5,
                max_m: 10.0,
                epsilon: 1e-8
            }
        );
    }

    #[test]
    fn test_empty_document_runs_on_mock_sources() {
        let station = ConfigLoader::load_from_str("", ConfigFormat::Toml).unwrap();
        assert!(ingestion::open_transport(&station.imu).is_ok());
        assert!(ingestion::open_camera(&station.camera).is_ok());
    }
}

#[cfg(test)]
mod replay_e2e_tests {
    use std::io::Write;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use contracts::ManualClock;
    use ingestion::{InertialIngestor, IngestOutcome, MockCamera, ReplayTransport};
    use sync_engine::{CycleOutcome, FrameLoopConfig, FrameSynchronizer, LuminanceDepthEstimator};

    use crate::support::{get, get_json, SharedState};

    /// 20 records 1 ms apart plus two malformed lines
    fn replay_log() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..20u64 {
            if i == 5 {
                writeln!(file, "garbage").unwrap();
            }
            if i == 12 {
                writeln!(file, "{} 0.1 0.2 9.8 0.0", i * 1000).unwrap();
            }
            writeln!(file, "{} 0.1 0.2 9.8 0.01 0.02 0.03", i * 1000).unwrap();
        }
        file
    }

    #[tokio::test]
    async fn test_replay_through_both_loops_to_queries() {
        let log = replay_log();
        let state = SharedState::new(64, 8);
        let clock = Arc::new(ManualClock::new(1000.0));

        // Inertial loop, one iteration at a time
        let transport = ReplayTransport::open(log.path()).unwrap();
        let mut ingestor = InertialIngestor::new(Box::new(transport), state.buffer.clone(), clock.clone());
        let mut appended = 0;
        let mut malformed = 0;
        for _ in 0..22 {
            match ingestor.step() {
                IngestOutcome::Appended(_) => appended += 1,
                IngestOutcome::Malformed => malformed += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!((appended, malformed), (20, 2));
        assert_eq!(ingestor.step(), IngestOutcome::Idle);

        // Frame loop, single cycle at T = 1000.0105 with a 5 ms window
        clock.set(1000.0105);
        let mut frame_loop = FrameSynchronizer::new(
            Box::new(MockCamera::new(16, 12)),
            Box::new(LuminanceDepthEstimator::new(8, 8)),
            state.buffer.clone(),
            state.history.clone(),
            state.slot.clone(),
            clock.clone(),
        )
        .with_config(FrameLoopConfig {
            window_s: 0.005,
            ..FrameLoopConfig::default()
        });
        let frame_metrics = frame_loop.metrics();

        match frame_loop.cycle() {
            CycleOutcome::Published { samples, .. } => assert_eq!(samples, 5),
            other => panic!("expected publish, got {other:?}"),
        }

        let service = state
            .service()
            .with_ingestion_metrics(ingestor.metrics())
            .with_frame_metrics(frame_metrics);

        let bundle = get_json(service.clone(), "/imu_buffer").await;
        assert_eq!(bundle["frame_timestamp"], 1000.0105);
        let stamps: Vec<f64> = bundle["samples"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["timestamp"].as_f64().unwrap())
            .collect();
        let expected = [1000.006, 1000.007, 1000.008, 1000.009, 1000.010];
        assert_eq!(stamps.len(), expected.len());
        for (got, want) in stamps.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{got} vs {want}");
        }

        let raw = get_json(service.clone(), "/imu_raw").await;
        assert_eq!(raw["samples"].as_array().unwrap().len(), 20);

        let status = get_json(service.clone(), "/status").await;
        assert_eq!(status["samples_ingested"], 20);
        assert_eq!(status["records_malformed"], 2);
        assert_eq!(status["frames_published"], 1);

        let (code, png) = get(service.clone(), "/frame_depth_raw").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(&png[1..4], b"PNG");

        let (code, jpeg) = get(service, "/frame_rgb").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}

#[cfg(test)]
mod live_e2e_tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use contracts::{SystemClock, WallClock};
    use ingestion::{InertialIngestor, MockCamera, MockImuTransport};
    use sync_engine::{in_window, FrameLoopConfig, FrameSynchronizer, LuminanceDepthEstimator};

    use crate::support::{get_json, SharedState};

    /// Mock sources -> both loops on threads -> queries
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_live_loops_publish_consistent_state() {
        let state = SharedState::new(500, 16);
        let clock: Arc<dyn WallClock> = Arc::new(SystemClock);
        let shutdown = Arc::new(AtomicBool::new(false));

        let ingestor = InertialIngestor::new(
            Box::new(MockImuTransport::new(1000.0).with_corruption(25)),
            state.buffer.clone(),
            clock.clone(),
        );
        let ingestion_metrics = ingestor.metrics();

        let config = FrameLoopConfig {
            period: Duration::from_millis(20),
            window_s: 0.1,
            ..FrameLoopConfig::default()
        };
        let range = config.range;
        let frame_loop = FrameSynchronizer::new(
            Box::new(MockCamera::new(64, 48).with_drop_every(4)),
            Box::new(LuminanceDepthEstimator::new(32, 32)),
            state.buffer.clone(),
            state.history.clone(),
            state.slot.clone(),
            clock,
        )
        .with_config(config);
        let frame_metrics = frame_loop.metrics();

        let ingest_handle = ingestor.spawn(shutdown.clone()).unwrap();
        let frame_handle = frame_loop.spawn(shutdown.clone()).unwrap();

        let service = state
            .service()
            .with_ingestion_metrics(ingestion_metrics)
            .with_frame_metrics(frame_metrics.clone());

        let deadline = Instant::now() + Duration::from_secs(10);
        while frame_metrics.published() < 5 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        // Queries answer while both loops are still running
        let status = get_json(service.clone(), "/status").await;
        assert_eq!(status["published"], true);

        shutdown.store(true, Ordering::Relaxed);
        let ingestion = ingest_handle.join().unwrap();
        let fusion = frame_handle.join().unwrap();

        assert!(fusion.published >= 5);
        assert!(fusion.skipped >= 1);
        assert_eq!(fusion.failed, 0);
        assert!(ingestion.samples_ingested > 0);
        assert!(ingestion.records_malformed > 0);

        let latest = state.slot.load().unwrap();
        assert_eq!(latest.cycle, fusion.published);
        assert_eq!(latest.distance_map.dimensions(), (32, 32));
        let (lo, hi) = latest.distance_map.min_max();
        assert!(lo as f64 >= range.min_m - 1e-4 && hi as f64 <= range.max_m + 1e-4);
        assert!(latest
            .bundle
            .samples
            .iter()
            .all(|s| in_window(latest.frame_timestamp(), s.timestamp, 0.1)));

        let bundle = get_json(service.clone(), "/imu_buffer").await;
        assert_eq!(bundle["frame_timestamp"], latest.frame_timestamp());
        assert_eq!(
            bundle["samples"].as_array().unwrap().len(),
            latest.bundle.len()
        );

        let history = get_json(service, "/bundles?limit=3").await;
        let bundles = history["bundles"].as_array().unwrap();
        assert_eq!(bundles.len(), 3);
        assert_eq!(bundles[2]["frame_timestamp"], latest.frame_timestamp());
    }
}
