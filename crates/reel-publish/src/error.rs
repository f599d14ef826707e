//! Publish error types.

use thiserror::Error;

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that can occur while publishing a reel.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Container creation refused: unreachable URL or bad credential.
    /// Terminal for the publish stage, never retried.
    #[error("Publish rejected: {0}")]
    Rejected(String),

    /// The platform reported a terminal processing failure.
    #[error("Platform error: {0}")]
    Platform(String),

    /// The poll loop hit its wall-clock deadline before the container
    /// reached a terminal state.
    #[error("Publish timed out after {0} seconds")]
    Timeout(u64),

    #[error("Credential not configured: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl PublishError {
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
