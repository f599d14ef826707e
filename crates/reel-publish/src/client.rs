//! Graph API HTTP client for the Reels container protocol.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::PublishConfig;
use crate::error::{PublishError, PublishResult};

/// State of a media container as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerState {
    /// Ready to publish
    Finished,
    /// Still processing
    InProgress,
    /// Terminal failure, with the platform's status text
    Error(String),
}

/// A published reel.
#[derive(Debug, Clone)]
pub struct PublishedMedia {
    /// Platform media id
    pub media_id: String,
    /// Permalink to the published reel
    pub permalink: String,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: Option<String>,
    error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status_code: Option<String>,
    status: Option<String>,
    error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: Option<String>,
}

impl GraphError {
    fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// HTTP client for the Reels Graph API.
pub struct ReelsClient {
    http: Client,
    config: PublishConfig,
}

impl ReelsClient {
    /// Create a new client.
    pub fn new(config: PublishConfig) -> PublishResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(PublishError::Network)?;

        Ok(Self { http, config })
    }

    /// The configured poll cadence.
    pub fn poll_interval(&self) -> std::time::Duration {
        self.config.poll_interval
    }

    /// The configured hard poll deadline.
    pub fn poll_timeout(&self) -> std::time::Duration {
        self.config.poll_timeout
    }

    /// Create a media container from a publicly reachable video URL.
    ///
    /// A non-success response here is `Rejected`: the URL is unreachable
    /// or the credential is invalid, and the stage must not retry.
    pub async fn create_container(&self, video_url: &str, caption: &str) -> PublishResult<String> {
        let url = format!(
            "{}/{}/media",
            self.config.graph_api_base, self.config.account_id
        );

        debug!(video_url = %video_url, "Creating media container");

        let response = self
            .http
            .post(&url)
            .form(&[
                ("video_url", video_url),
                ("media_type", "REELS"),
                ("caption", caption),
                ("share_to_feed", "true"),
                ("access_token", self.config.access_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body: IdResponse = response
            .json()
            .await
            .map_err(|e| PublishError::UnexpectedResponse(e.to_string()))?;

        if !status.is_success() {
            let message = body
                .error
                .map(|e| e.message_or("Unknown error"))
                .unwrap_or_else(|| format!("container creation returned {}", status));
            return Err(PublishError::rejected(message));
        }

        let container_id = body.id.ok_or_else(|| {
            PublishError::UnexpectedResponse("container response missing id".to_string())
        })?;

        info!(container_id = %container_id, "Media container created");
        Ok(container_id)
    }

    /// Query the processing state of a container.
    pub async fn container_state(&self, container_id: &str) -> PublishResult<ContainerState> {
        let url = format!("{}/{}", self.config.graph_api_base, container_id);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("fields", "status_code,status"),
                ("access_token", self.config.access_token.as_str()),
            ])
            .send()
            .await?;

        let body: StatusResponse = response
            .json()
            .await
            .map_err(|e| PublishError::UnexpectedResponse(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(PublishError::platform(err.message_or("Unknown error")));
        }

        match body.status_code.as_deref() {
            Some("FINISHED") => Ok(ContainerState::Finished),
            Some("ERROR") => Ok(ContainerState::Error(
                body.status.unwrap_or_else(|| "Unknown error".to_string()),
            )),
            _ => Ok(ContainerState::InProgress),
        }
    }

    /// Publish a finished container.
    pub async fn publish(&self, container_id: &str) -> PublishResult<PublishedMedia> {
        let url = format!(
            "{}/{}/media_publish",
            self.config.graph_api_base, self.config.account_id
        );

        let response = self
            .http
            .post(&url)
            .form(&[
                ("creation_id", container_id),
                ("access_token", self.config.access_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body: IdResponse = response
            .json()
            .await
            .map_err(|e| PublishError::UnexpectedResponse(e.to_string()))?;

        if !status.is_success() {
            let message = body
                .error
                .map(|e| e.message_or("Unknown error"))
                .unwrap_or_else(|| format!("publish returned {}", status));
            return Err(PublishError::platform(message));
        }

        let media_id = body.id.ok_or_else(|| {
            PublishError::UnexpectedResponse("publish response missing id".to_string())
        })?;
        let permalink = format!("https://www.instagram.com/reel/{}/", media_id);

        info!(media_id = %media_id, "Reel published");
        Ok(PublishedMedia {
            media_id,
            permalink,
        })
    }
}
