//! Publish sub-record for the Reels container protocol.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of the publish stage.
///
/// Independent from the job's primary status: a job can be `done` with a
/// failed publish, and that is distinguishable from a successful one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    /// Container created, waiting for the platform to process it
    Uploading,
    /// No public URL source or no credential configured; never attempted
    Skipped,
    /// Reel published
    Success,
    /// Platform rejected, errored, or timed out
    Failed,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Uploading => "uploading",
            PublishStatus::Skipped => "skipped",
            PublishStatus::Success => "success",
            PublishStatus::Failed => "failed",
        }
    }
}

/// Publish stage record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PublishRecord {
    /// Stage outcome
    pub status: PublishStatus,
    /// Platform media id, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Platform permalink, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    /// Platform error, recorded verbatim on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PublishRecord {
    /// Record for a stage that was never attempted.
    pub fn skipped() -> Self {
        Self {
            status: PublishStatus::Skipped,
            external_id: None,
            external_url: None,
            error: None,
        }
    }

    /// Record for a container in flight.
    pub fn uploading() -> Self {
        Self {
            status: PublishStatus::Uploading,
            external_id: None,
            external_url: None,
            error: None,
        }
    }

    /// Record a successful publish.
    pub fn success(external_id: impl Into<String>, external_url: impl Into<String>) -> Self {
        Self {
            status: PublishStatus::Success,
            external_id: Some(external_id.into()),
            external_url: Some(external_url.into()),
            error: None,
        }
    }

    /// Record a failed publish with the platform's reason verbatim.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: PublishStatus::Failed,
            external_id: None,
            external_url: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_carries_reason_verbatim() {
        let rec = PublishRecord::failed("Media URL is not reachable");
        assert_eq!(rec.status, PublishStatus::Failed);
        assert_eq!(rec.error.as_deref(), Some("Media URL is not reachable"));
        assert!(rec.external_id.is_none());
    }

    #[test]
    fn test_success_and_skipped_are_distinct() {
        let ok = PublishRecord::success("18001234", "https://www.instagram.com/reel/18001234/");
        assert_eq!(ok.status, PublishStatus::Success);
        assert_ne!(ok.status, PublishRecord::skipped().status);
    }
}
