use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use vidseg::{
    api,
    config::Config,
    pipeline::{RunOutcome, SegmentationService, TaskPoller},
    twelvelabs::TwelveLabsClient,
};

const ANALYSIS_TEXT: &str = r#"Here is the breakdown you asked for:
{"segments":[{"count":0,"start":0,"end":30,"title":"Intro","summary":"Course overview."},{"count":0,"start":30,"end":410,"title":"Derivatives","summary":"Limit definition."}]}
Hope this helps!"#;

fn config_for(server: &MockServer) -> Config {
    let base_url = server.base_url();
    Config::from_lookup(move |key| match key {
        "TWELVELABS_API_KEY" => Some("integration-key".into()),
        "TWELVELABS_INDEX_ID" => Some("idx-int".into()),
        "TWELVELABS_API_URL" => Some(base_url.clone()),
        "VIDSEG_WARMUP_DELAY_SECS" => Some("0".into()),
        "VIDSEG_REQUEST_TIMEOUT_SECS" => Some("5".into()),
        _ => None,
    })
    .expect("integration config")
}

fn service_for(server: &MockServer, timeout: Duration) -> SegmentationService {
    let config = config_for(server);
    let client = TwelveLabsClient::new(&config).expect("client");
    let poller = TaskPoller::new(Duration::from_millis(20), timeout, Duration::ZERO);
    SegmentationService::new(Arc::new(client), poller)
}

#[tokio::test]
async fn segments_video_against_mock_service() {
    let server = MockServer::start_async().await;
    let submit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/tasks")
                .header("x-api-key", "integration-key")
                .body_contains("idx-int");
            then.status(201).json_body(json!({ "_id": "T1" }));
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks/T1");
            then.status(200)
                .json_body(json!({ "_id": "T1", "status": "ready", "video_id": "V1" }));
        })
        .await;
    let analyze = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/analyze")
                .json_body_partial(r#"{ "video_id": "V1" }"#);
            then.status(200)
                .json_body(json!({ "id": "gen-1", "data": ANALYSIS_TEXT }));
        })
        .await;

    let result = service_for(&server, Duration::from_secs(5))
        .index_and_segment("http://x/video.mp4", &CancellationToken::new())
        .await;

    submit.assert_async().await;
    poll.assert_async().await;
    analyze.assert_async().await;

    assert_eq!(result.diagnostics.outcome, RunOutcome::Completed);
    let titles: Vec<_> = result
        .segments
        .iter()
        .map(|segment| segment.title.as_str())
        .collect();
    assert_eq!(titles, ["Intro", "Derivatives"]);
    assert_eq!(result.segments[1].end, 410.0);
}

#[tokio::test]
async fn rejected_submission_yields_empty_segments() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/tasks");
            then.status(401).json_body(json!({ "code": "api_key_invalid" }));
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks/T1");
            then.status(200).json_body(json!({ "status": "ready", "video_id": "V1" }));
        })
        .await;

    let result = service_for(&server, Duration::from_secs(5))
        .index_and_segment("http://x/video.mp4", &CancellationToken::new())
        .await;

    assert!(result.segments.is_empty());
    assert_eq!(result.diagnostics.outcome, RunOutcome::SubmissionFailed);
    assert_eq!(poll.hits_async().await, 0);
}

#[tokio::test]
async fn failed_task_never_reaches_analysis() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/tasks");
            then.status(201).json_body(json!({ "_id": "T2" }));
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks/T2");
            then.status(200).json_body(json!({ "_id": "T2", "status": "failed" }));
        })
        .await;
    let analyze = server
        .mock_async(|when, then| {
            when.method(POST).path("/analyze");
            then.status(200).json_body(json!({ "data": ANALYSIS_TEXT }));
        })
        .await;

    let result = service_for(&server, Duration::from_secs(5))
        .index_and_segment("http://x/video.mp4", &CancellationToken::new())
        .await;

    assert!(result.segments.is_empty());
    assert_eq!(result.diagnostics.outcome, RunOutcome::TaskFailed);
    assert_eq!(poll.hits_async().await, 1);
    assert_eq!(analyze.hits_async().await, 0);
}

#[tokio::test]
async fn polling_outage_runs_into_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/tasks");
            then.status(201).json_body(json!({ "_id": "T3" }));
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks/T3");
            then.status(503).body("upstream unavailable");
        })
        .await;

    let result = service_for(&server, Duration::from_millis(150))
        .index_and_segment("http://x/video.mp4", &CancellationToken::new())
        .await;

    assert!(result.segments.is_empty());
    assert_eq!(result.diagnostics.outcome, RunOutcome::TimedOut);
    assert!(poll.hits_async().await > 1);
}

#[tokio::test]
async fn http_surface_serves_segments_from_real_pipeline() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/tasks");
            then.status(201).json_body(json!({ "_id": "T4" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tasks/T4");
            then.status(200)
                .json_body(json!({ "_id": "T4", "status": "ready", "video_id": "V4" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/analyze");
            then.status(200).json_body(json!({ "data": ANALYSIS_TEXT }));
        })
        .await;

    let app = api::create_router(Arc::new(service_for(&server, Duration::from_secs(5))));
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/segment-video")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "videoUrl": "http://x/video.mp4", "lectureId": "calc-1" }).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(json["lectureId"], "calc-1");
    assert_eq!(json["segments"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["rawMetadata"]["diagnostics"]["video_id"], "V4");
}
