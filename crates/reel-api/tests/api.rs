//! API integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use reel_api::{create_router, ApiConfig, AppState};
use reel_jobs::{FfmpegComposer, JobStore, Orchestrator};
use reel_models::{Job, JobInputs};

async fn test_state(dir: &Path) -> AppState {
    let config = ApiConfig {
        upload_dir: dir.join("uploads"),
        output_dir: dir.join("outputs"),
        ..ApiConfig::default()
    };
    tokio::fs::create_dir_all(&config.upload_dir).await.unwrap();
    tokio::fs::create_dir_all(&config.output_dir).await.unwrap();

    let store = Arc::new(JobStore::new());
    let composer = Arc::new(FfmpegComposer::new(&config.output_dir, 300));
    let orchestrator = Orchestrator::new(Arc::clone(&store), composer);

    AppState {
        config,
        store,
        orchestrator,
        backup: None,
    }
}

/// Insert a finished job with a 300-byte patterned artifact.
async fn insert_done_job(state: &AppState) -> (String, Vec<u8>) {
    let output = state.config.output_dir.join("reel_test.mp4");
    let content: Vec<u8> = (0..300u16).map(|i| (i % 251) as u8).collect();
    tokio::fs::write(&output, &content).await.unwrap();

    let mut job = Job::new(
        JobInputs {
            input_a: PathBuf::from("/tmp/a.mp4"),
            input_b: PathBuf::from("/tmp/b.mp4"),
        },
        None,
        None,
    );
    job.complete(output);
    let id = state.store.insert(job).await;

    (id.to_string(), content)
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await, None);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/jobs/550e8400-e29b-41d4-a716-446655440000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_job_id_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/jobs/short")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_reports_done_job_with_urls() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;
    let (job_id, _) = insert_done_job(&state).await;
    let app = create_router(state, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/jobs/{}", job_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "done");
    assert_eq!(json["progress"], 100);
    assert_eq!(json["output_ref"], "reel_test.mp4");
    assert_eq!(
        json["preview_url"],
        format!("/api/jobs/{}/stream", job_id)
    );
}

#[tokio::test]
async fn test_stream_byte_ranges_are_disjoint_and_contiguous() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;
    let (job_id, content) = insert_done_job(&state).await;
    let app = create_router(state, None);

    let mut slices = Vec::new();
    for range in ["bytes=0-99", "bytes=100-199"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/jobs/{}/stream", job_id))
                    .header(header::RANGE, range)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        let content_range = response
            .headers()
            .get(header::CONTENT_RANGE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_range.ends_with("/300"), "{}", content_range);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes.len(), 100);
        slices.push(bytes.to_vec());
    }

    assert_ne!(slices[0], slices[1]);
    let mut joined = slices[0].clone();
    joined.extend_from_slice(&slices[1]);
    assert_eq!(joined, content[..200].to_vec());
}

#[tokio::test]
async fn test_download_sets_attachment_disposition() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;
    let (job_id, content) = insert_done_job(&state).await;
    let app = create_router(state, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/jobs/{}/download", job_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.to_vec(), content);
}

#[tokio::test]
async fn test_serve_video_rejects_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/videos/..")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_without_multipart_is_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path()).await, None);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/jobs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
