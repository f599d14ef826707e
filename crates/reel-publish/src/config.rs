//! Publish configuration.

use std::time::Duration;

use crate::error::{PublishError, PublishResult};

/// Default Graph API base URL.
const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v21.0";

/// Configuration for the Reels publish driver.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Graph API base URL
    pub graph_api_base: String,
    /// Business account id owning the reel
    pub account_id: String,
    /// Access token
    pub access_token: String,
    /// Container poll cadence
    pub poll_interval: Duration,
    /// Hard wall-clock deadline for the poll loop
    pub poll_timeout: Duration,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl PublishConfig {
    /// Create config from environment variables.
    ///
    /// Returns `ConfigError` when the credential is not configured;
    /// callers treat that as "skip the publish stage".
    pub fn from_env() -> PublishResult<Self> {
        Ok(Self {
            graph_api_base: std::env::var("REELS_GRAPH_API_BASE")
                .unwrap_or_else(|_| DEFAULT_GRAPH_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            account_id: std::env::var("REELS_ACCOUNT_ID")
                .map_err(|_| PublishError::config_error("REELS_ACCOUNT_ID not set"))?,
            access_token: std::env::var("REELS_ACCESS_TOKEN")
                .map_err(|_| PublishError::config_error("REELS_ACCESS_TOKEN not set"))?,
            poll_interval: Duration::from_secs(
                std::env::var("PUBLISH_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            poll_timeout: Duration::from_secs(
                std::env::var("PUBLISH_POLL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            request_timeout: Duration::from_secs(30),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_requires_credential() {
        // Serialize env mutation against other tests in this binary
        std::env::remove_var("REELS_ACCOUNT_ID");
        std::env::remove_var("REELS_ACCESS_TOKEN");
        let err = PublishConfig::from_env().unwrap_err();
        assert!(matches!(err, PublishError::ConfigError(_)));
    }
}
