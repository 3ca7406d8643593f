//! # Sync Engine
//!
//! 深度相机与 IMU 的帧级同步。
//!
//! 负责：
//! - 惯性样本环形缓冲区 (固定容量，FIFO 淘汰)
//! - 同步包历史 (固定容量)
//! - 时间窗规则：`0 < T - t < window`
//! - 逐帧 min-max 归一化的深度 → 距离转换
//! - 帧采集循环：采集 → 推理 → 转换 → 开窗 → 原子发布
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::{FrameLoopConfig, FrameSynchronizer, InertialRingBuffer, BundleHistory};
//!
//! let buffer = Arc::new(InertialRingBuffer::new(config.imu.buffer_capacity));
//! let history = Arc::new(BundleHistory::new(config.sync.history_capacity));
//! let slot = Arc::new(LatestStateSlot::new());
//!
//! let frame_loop = FrameSynchronizer::new(camera, estimator, buffer, history, slot, clock)
//!     .with_config(FrameLoopConfig::from_station(&config));
//! let handle = frame_loop.spawn(shutdown.clone())?;
//! ```

mod buffer;
mod depth;
mod engine;
mod error;
mod metrics;
mod window;

// Re-exports
pub use buffer::{BoundedFifo, BundleHistory, InertialRingBuffer};
pub use depth::{depth_to_distance, prepare_input, DistanceRange, LuminanceDepthEstimator};
pub use engine::{CycleOutcome, FrameLoopConfig, FrameSynchronizer};
pub use error::{Result, SyncError};
pub use metrics::{FrameLoopMetrics, FrameLoopSnapshot};
pub use window::{in_window, synchronize, window_samples};
