//! # Ingestion
//!
//! Sensor acquisition module.
//!
//! Responsibilities:
//! - Decode 7-field inertial text records
//! - Anchor the device microsecond counter to the wall clock
//! - Run the Inertial Ingestion Loop (one blocking read per iteration)
//! - Provide inertial transports (serial, replay, mock) and camera sources
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{open_transport, InertialIngestor};
//!
//! let transport = open_transport(&config.imu)?;
//! let ingestor = InertialIngestor::new(transport, ring_buffer.clone(), Arc::new(SystemClock))
//!     .with_error_backoff(config.imu.error_backoff());
//! let handle = ingestor.spawn(shutdown.clone())?;
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::{MockCamera, MockImuTransport};
//!
//! let transport = MockImuTransport::new(200.0).with_corruption(50);
//! let camera = MockCamera::new(800, 600);
//! ```

mod anchor;
mod camera;
mod error;
mod ingestor;
mod metrics;
mod record;
mod transports;

// Re-exports
pub use anchor::ClockAnchor;
pub use camera::{open_camera, MockCamera};
#[cfg(feature = "v4l")]
pub use camera::V4lCamera;
pub use error::{IngestionError, Result};
pub use ingestor::{IngestOutcome, InertialIngestor};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use record::{parse_record, RawImuRecord, RECORD_FIELDS};
pub use transports::{
    open_transport, LineAssembler, MockImuTransport, ReplayTransport, ScriptedRead,
    ScriptedTransport, SerialTransport,
};
