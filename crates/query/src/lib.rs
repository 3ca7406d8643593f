//! # Query
//!
//! Read-only access to the published acquisition state.
//!
//! - [`QueryService`]: current frame, current distance map, latest bundle,
//!   raw inertial buffer, bundle history, status
//! - [`server`]: HTTP routes over the service (axum)
//!
//! No operation waits on a producer: frames and bundles come from one
//! atomic pointer load, buffers from a short copy under their lock.

mod error;
pub mod server;
mod service;

pub use error::{QueryError, Result};
pub use server::{router, serve};
pub use service::{QueryService, StatusRecord};
