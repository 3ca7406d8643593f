//! HTTP binding of the query operations
//!
//! | route              | body                                   |
//! |--------------------|----------------------------------------|
//! | `/frame_rgb`       | JPEG, 503 before the first frame       |
//! | `/frame_depth_raw` | 16-bit PNG (mm), 503 / 500             |
//! | `/imu_buffer`      | latest bundle JSON                     |
//! | `/imu_raw`         | full inertial buffer JSON              |
//! | `/bundles?limit=N` | newest N bundles, oldest first         |
//! | `/status`          | counters and depths                    |

use std::future::Future;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use observability::metrics::record_query_request;
use publisher::{JPEG_CONTENT_TYPE, PNG_CONTENT_TYPE};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

use crate::error::QueryError;
use crate::service::QueryService;

/// Build the router over a service handle
pub fn router(service: QueryService) -> Router {
    Router::new()
        .route("/frame_rgb", get(frame_rgb))
        .route("/frame_depth_raw", get(frame_depth_raw))
        .route("/imu_buffer", get(imu_buffer))
        .route("/imu_raw", get(imu_raw))
        .route("/bundles", get(bundles))
        .route("/status", get(status))
        .with_state(service)
}

/// Serve until `shutdown` resolves, then drain in-flight requests
pub async fn serve<F>(listener: TcpListener, service: QueryService, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "query server listening");
    }
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("query server stopped");
    Ok(())
}

fn observed(route: &'static str, response: Response) -> Response {
    let status = response.status();
    record_query_request(route, status.as_u16());
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!(route, status = status.as_u16(), "query failed");
    }
    response
}

#[instrument(name = "query_frame_rgb", level = "trace", skip_all)]
async fn frame_rgb(State(service): State<QueryService>) -> Response {
    let response = match service.current_frame() {
        Ok(frame) => ([(header::CONTENT_TYPE, JPEG_CONTENT_TYPE)], frame.data).into_response(),
        Err(e) => e.into_response(),
    };
    observed("frame_rgb", response)
}

#[instrument(name = "query_frame_depth_raw", level = "trace", skip_all)]
async fn frame_depth_raw(State(service): State<QueryService>) -> Response {
    let response = match encode_depth(service).await {
        Ok(png) => ([(header::CONTENT_TYPE, PNG_CONTENT_TYPE)], png).into_response(),
        Err(e) => e.into_response(),
    };
    observed("frame_depth_raw", response)
}

/// PNG compression runs off the async workers
async fn encode_depth(service: QueryService) -> Result<bytes::Bytes, QueryError> {
    let map = service.current_distance_map()?;
    tokio::task::spawn_blocking(move || publisher::encode_distance_png(&map))
        .await
        .map_err(|e| QueryError::Task(e.to_string()))?
        .map_err(QueryError::from)
}

#[instrument(name = "query_imu_buffer", level = "trace", skip_all)]
async fn imu_buffer(State(service): State<QueryService>) -> Response {
    observed("imu_buffer", Json(service.latest_bundle()).into_response())
}

#[instrument(name = "query_imu_raw", level = "trace", skip_all)]
async fn imu_raw(State(service): State<QueryService>) -> Response {
    observed("imu_raw", Json(service.raw_buffer()).into_response())
}

#[derive(Debug, Deserialize)]
struct BundlesParams {
    limit: Option<usize>,
}

#[instrument(name = "query_bundles", level = "trace", skip_all)]
async fn bundles(
    State(service): State<QueryService>,
    Query(params): Query<BundlesParams>,
) -> Response {
    let limit = params.limit.unwrap_or_else(|| service.history_capacity());
    observed("bundles", Json(service.recent_bundles(limit)).into_response())
}

#[instrument(name = "query_status", level = "trace", skip_all)]
async fn status(State(service): State<QueryService>) -> Response {
    observed("status", Json(service.status()).into_response())
}
