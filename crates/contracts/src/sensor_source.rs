//! Collaborator traits - sensor transports and the depth model
//!
//! Decouples the acquisition loops from concrete devices so that serial
//! ports, replay files, V4L2 cameras and synthetic sources share one API.

use crate::{CameraFrame, ContractError, DepthMap, InertialSample};

/// Blocking, line-oriented inertial transport
///
/// Each call blocks until a line is available or the transport's read
/// timeout elapses.
///
/// # Example
///
/// ```ignore
/// let mut transport: Box<dyn InertialTransport> = open_transport(&config)?;
/// while let Some(line) = transport.read_line()? {
///     println!("{line}");
/// }
/// ```
pub trait InertialTransport: Send {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Read the next line without its terminator
    ///
    /// Returns `Ok(None)` when no complete line arrived before the read
    /// timeout.
    ///
    /// # Errors
    /// Device or I/O failures. Callers treat these as transient.
    fn read_line(&mut self) -> Result<Option<String>, ContractError>;
}

/// Blocking camera source yielding RGB frames
pub trait CameraSource: Send {
    /// Source name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Read the next frame
    ///
    /// Returns `Ok(None)` when the device produced no frame this time.
    fn read_frame(&mut self) -> Result<Option<CameraFrame>, ContractError>;
}

/// Depth-estimation model with fixed input dimensions
pub trait DepthEstimator: Send {
    /// Model name (used for logging)
    fn name(&self) -> &str;

    /// Required `(width, height)` of the input image
    fn input_size(&self) -> (u32, u32);

    /// Estimate raw relative depth for an image of `input_size()`
    ///
    /// The returned map must have the same dimensions as the input.
    fn estimate_depth(&mut self, image: &CameraFrame) -> Result<DepthMap, ContractError>;
}

/// Destination for inertial samples produced by the ingestion loop
pub trait SampleSink: Send + Sync {
    /// Append one sample
    fn append(&self, sample: InertialSample);
}
