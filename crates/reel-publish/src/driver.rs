//! Publish driver: create, poll to readiness, publish.
//!
//! The poll loop is an explicit state machine with a cadence and a hard
//! wall-clock deadline; the underlying container may still complete later
//! on the platform's side, but we never wait indefinitely.

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::client::{ContainerState, PublishedMedia, ReelsClient};
use crate::error::{PublishError, PublishResult};

/// Drive the full two-phase publish protocol for one video.
pub async fn drive_publish(
    client: &ReelsClient,
    video_url: &str,
    caption: &str,
) -> PublishResult<PublishedMedia> {
    let container_id = client.create_container(video_url, caption).await?;

    wait_until_finished(client, &container_id).await?;

    client.publish(&container_id).await
}

/// Poll a container until it is ready to publish, the platform reports a
/// terminal failure, or the deadline expires.
async fn wait_until_finished(client: &ReelsClient, container_id: &str) -> PublishResult<()> {
    let deadline = Instant::now() + client.poll_timeout();
    let interval = client.poll_interval();

    loop {
        match client.container_state(container_id).await? {
            ContainerState::Finished => {
                info!(container_id = %container_id, "Container finished processing");
                return Ok(());
            }
            ContainerState::Error(status) => {
                return Err(PublishError::platform(status));
            }
            ContainerState::InProgress => {
                debug!(container_id = %container_id, "Container still processing");
            }
        }

        if Instant::now() + interval > deadline {
            return Err(PublishError::Timeout(client.poll_timeout().as_secs()));
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PublishConfig;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base: &str, poll_interval_ms: u64, poll_timeout_ms: u64) -> PublishConfig {
        PublishConfig {
            graph_api_base: base.trim_end_matches('/').to_string(),
            account_id: "17840001".to_string(),
            access_token: "test-token".to_string(),
            poll_interval: Duration::from_millis(poll_interval_ms),
            poll_timeout: Duration::from_millis(poll_timeout_ms),
            request_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_publish_happy_path() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/17840001/media"))
            .and(body_string_contains("media_type=REELS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "container-1"})))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/container-1"))
            .and(query_param("fields", "status_code,status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status_code": "FINISHED"})),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/17840001/media_publish"))
            .and(body_string_contains("creation_id=container-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "18009999"})))
            .mount(&server)
            .await;

        let client = ReelsClient::new(test_config(&server.uri(), 10, 1_000)).unwrap();
        let media = drive_publish(&client, "https://cdn.example.com/reel.mp4", "hello")
            .await
            .unwrap();

        assert_eq!(media.media_id, "18009999");
        assert!(media.permalink.contains("18009999"));
    }

    #[tokio::test]
    async fn test_container_rejection_is_terminal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/17840001/media"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Media URL is not reachable"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReelsClient::new(test_config(&server.uri(), 10, 1_000)).unwrap();
        let err = drive_publish(&client, "https://cdn.example.com/reel.mp4", "hello")
            .await
            .unwrap_err();

        match err {
            PublishError::Rejected(msg) => assert_eq!(msg, "Media URL is not reachable"),
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_loop_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/17840001/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "container-2"})))
            .mount(&server)
            .await;

        // Platform never reaches a terminal state
        Mock::given(method("GET"))
            .and(path("/container-2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status_code": "IN_PROGRESS"})),
            )
            .mount(&server)
            .await;

        let client = ReelsClient::new(test_config(&server.uri(), 20, 100)).unwrap();
        let err = drive_publish(&client, "https://cdn.example.com/reel.mp4", "hello")
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_container_error_surfaces_platform_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/17840001/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "container-3"})))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/container-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status_code": "ERROR",
                "status": "Video format not supported"
            })))
            .mount(&server)
            .await;

        let client = ReelsClient::new(test_config(&server.uri(), 10, 1_000)).unwrap();
        let err = drive_publish(&client, "https://cdn.example.com/reel.mp4", "hello")
            .await
            .unwrap_err();

        match err {
            PublishError::Platform(msg) => assert_eq!(msg, "Video format not supported"),
            other => panic!("expected Platform, got {:?}", other),
        }
    }
}
