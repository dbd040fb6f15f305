//! HTTP surface for vidseg.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /api/segment-video` – Index a video, wait for it, and return its topic segments.
//!   Accepts `{ "videoUrl": ..., "lectureId": ... }` and always answers `200` once the input is
//!   valid; failures show up as an empty `segments` list plus `rawMetadata.diagnostics`.
//! - `POST /api/index-video` – Submit a video for indexing and return the task id (`202`).
//! - `GET /api/task-status?taskId=` – Report the current status of an indexing task.
//! - `GET /api/test-connection` – Check the video service and the configured index.
//! - `GET /health` – Liveness check.
//! - `GET /metrics` – Segmentation run counters.

use crate::pipeline::SegmentationApi;
use crate::twelvelabs::TwelveLabsError;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Build the HTTP router exposing the segmentation API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SegmentationApi + 'static,
{
    Router::new()
        .route("/api/segment-video", post(segment_video::<S>))
        .route("/api/index-video", post(index_video::<S>))
        .route("/api/task-status", get(task_status::<S>))
        .route("/api/test-connection", get(test_connection::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/health", get(health))
        .with_state(service)
}

/// Request body shared by the segment and index endpoints.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoRequest {
    /// Publicly reachable URL of the video.
    #[serde(default)]
    video_url: Option<String>,
    /// Caller-side lecture identifier, echoed back untouched.
    #[serde(default)]
    lecture_id: Option<Value>,
}

impl VideoRequest {
    fn require_url(&self) -> Result<&str, ApiError> {
        self.video_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::bad_request("videoUrl is required"))
    }
}

/// Index and segment a video.
///
/// The run is tied to this request: if the client goes away, the request future is dropped,
/// the guard cancels the token, and polling stops.
async fn segment_video<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<VideoRequest>,
) -> Result<Json<Value>, ApiError>
where
    S: SegmentationApi,
{
    let video_url = request.require_url()?;
    let lecture_id = request.lecture_id.clone().unwrap_or(Value::Null);
    tracing::info!(lecture_id = %lecture_id, video_url, "Segment request started");

    let cancel = CancellationToken::new();
    let _abort_on_drop = cancel.clone().drop_guard();
    let result = service.index_and_segment(video_url, cancel).await;

    tracing::info!(
        lecture_id = %lecture_id,
        segments = result.segments.len(),
        outcome = ?result.diagnostics.outcome,
        "Segment request finished"
    );
    for (position, segment) in result.segments.iter().take(5).enumerate() {
        tracing::debug!(
            position,
            start = segment.start,
            end = segment.end,
            title = %segment.title,
            "Segment"
        );
    }

    Ok(Json(json!({
        "lectureId": lecture_id,
        "segments": result.segments,
        "rawMetadata": result,
    })))
}

/// Submit a video for indexing without waiting for it.
async fn index_video<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<VideoRequest>,
) -> Result<Response, ApiError>
where
    S: SegmentationApi,
{
    let video_url = request.require_url()?;
    let task = service.start_indexing(video_url).await.map_err(|error| {
        tracing::error!(lecture_id = ?request.lecture_id, error = %error, "Failed to start indexing");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to start indexing")
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "success": true,
            "message": "Indexing task created",
            "task_id": task.task_id,
        })),
    )
        .into_response())
}

/// Query string for `GET /api/task-status`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskStatusQuery {
    #[serde(default)]
    task_id: Option<String>,
}

/// Report the current status of an indexing task.
async fn task_status<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<TaskStatusQuery>,
) -> Result<Json<Value>, ApiError>
where
    S: SegmentationApi,
{
    let task_id = query
        .task_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("taskId is required"))?;

    let report = service
        .task_status(task_id)
        .await
        .map_err(|error| match error {
            TwelveLabsError::InvalidIdentifier(_) => ApiError::bad_request(&error.to_string()),
            _ => ApiError::new(StatusCode::BAD_GATEWAY, error.to_string()),
        })?;
    Ok(Json(json!(report)))
}

/// Check the video service and the configured index.
async fn test_connection<S>(State(service): State<Arc<S>>) -> Response
where
    S: SegmentationApi,
{
    let report = service.verify_index().await;
    let status = if report.reachable {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(json!(report))).into_response()
}

/// Return the segmentation run counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<Value>
where
    S: SegmentationApi,
{
    Json(json!(service.metrics_snapshot()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
