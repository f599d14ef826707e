//! Job record and lifecycle definitions.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backup::BackupRecord;
use crate::publish::PublishRecord;

/// Unique identifier for a job.
///
/// Generated once at submission and never reused; the only handle clients
/// ever see.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primary job lifecycle state.
///
/// Backup and publish track their own sub-status independently; this enum
/// never regresses once terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job accepted, waiting for its background task to claim it
    #[default]
    Queued,
    /// Background task is running the composition
    Processing,
    /// Composed artifact exists and is usable
    Done,
    /// Composition or validation failed; no artifact
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state for the primary lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable error kinds for fatal job failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Inputs missing or rejected before composition
    Validation,
    /// Encoder failure, unsupported codec, or corrupt input
    Composition,
    /// Job cancelled between stages
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::Composition => "composition",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

/// Fatal failure recorded on a job when `status = error`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobFailure {
    /// Stable error kind
    pub kind: FailureKind,
    /// Free-text detail
    pub detail: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// References to the two uploaded source clips.
///
/// Owned by the orchestrator until the job terminates, then eligible for
/// cleanup.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobInputs {
    /// Top clip
    pub input_a: PathBuf,
    /// Bottom clip
    pub input_b: PathBuf,
}

/// A reel composition job tracked through its bounded lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Primary lifecycle state
    #[serde(default)]
    pub status: JobStatus,

    /// Progress percentage (0-100), monotonically non-decreasing
    #[serde(default)]
    pub progress: u8,

    /// Human-readable current activity, overwritten on stage transitions
    #[serde(default)]
    pub message: String,

    /// Uploaded source clips
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<JobInputs>,

    /// Composed artifact; write-once, never mutated after creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Caption for burn-in and publishing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Hashtags appended to the caption when publishing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<String>,

    /// Backup mirror sub-record; absent until the stage is attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupRecord>,

    /// Publish sub-record; absent until the stage is attempted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishRecord>,

    /// Fatal failure, populated only when `status = error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,

    /// Cooperative cancellation flag, checked between stages
    #[serde(default)]
    pub cancel_requested: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// When the primary lifecycle reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new queued job.
    pub fn new(inputs: JobInputs, caption: Option<String>, hashtags: Option<String>) -> Self {
        Self {
            id: JobId::new(),
            status: JobStatus::Queued,
            progress: 0,
            message: "Queued".to_string(),
            inputs: Some(inputs),
            output: None,
            caption,
            hashtags,
            backup: None,
            publish: None,
            error: None,
            cancel_requested: false,
            created_at: Utc::now(),
            terminal_at: None,
        }
    }

    /// Check if the primary lifecycle is terminal.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Claim the job for processing.
    pub fn start(&mut self) {
        self.status = JobStatus::Processing;
        self.message = "Starting".to_string();
    }

    /// Update progress, clamped to 0-100 and never decreasing.
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }

    /// Record the composed artifact and mark the job done.
    ///
    /// The output path is write-once, and a terminal status never
    /// regresses: a second call, or a call on a failed job, is ignored.
    pub fn complete(&mut self, output: PathBuf) {
        if self.output.is_some() || self.is_terminal() {
            return;
        }
        self.output = Some(output);
        self.status = JobStatus::Done;
        self.progress = 100;
        self.message = "Completed".to_string();
        self.terminal_at = Some(Utc::now());
    }

    /// Mark the job failed. A no-op when already terminal.
    pub fn fail(&mut self, failure: JobFailure) {
        if self.is_terminal() {
            return;
        }
        self.status = JobStatus::Error;
        self.message = "Error".to_string();
        self.error = Some(failure);
        self.terminal_at = Some(Utc::now());
    }

    /// Caption with hashtags appended, for publishing.
    pub fn publish_caption(&self) -> String {
        match (self.caption.as_deref(), self.hashtags.as_deref()) {
            (Some(c), Some(h)) if !h.trim().is_empty() => format!("{}\n\n{}", c, h.trim()),
            (Some(c), _) => c.to_string(),
            (None, Some(h)) => h.trim().to_string(),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_job() -> Job {
        Job::new(
            JobInputs {
                input_a: PathBuf::from("/tmp/a.mp4"),
                input_b: PathBuf::from("/tmp/b.mp4"),
            },
            Some("hello".to_string()),
            None,
        )
    }

    #[test]
    fn test_job_creation() {
        let job = test_job();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0);
        assert!(!job.is_terminal());
        assert!(job.output.is_none());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut job = test_job();
        job.set_progress(40);
        job.set_progress(25);
        assert_eq!(job.progress, 40);
        job.set_progress(90);
        assert_eq!(job.progress, 90);
        job.set_progress(200);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_output_is_write_once() {
        let mut job = test_job();
        job.complete(PathBuf::from("/tmp/out.mp4"));
        job.complete(PathBuf::from("/tmp/other.mp4"));
        assert_eq!(job.output, Some(PathBuf::from("/tmp/out.mp4")));
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_status_never_regresses_from_terminal() {
        let mut job = test_job();
        job.complete(PathBuf::from("/tmp/out.mp4"));
        job.fail(JobFailure::new(FailureKind::Composition, "late failure"));
        assert_eq!(job.status, JobStatus::Done);
        assert!(job.error.is_none());
    }

    #[test]
    fn test_publish_caption_appends_hashtags() {
        let mut job = test_job();
        job.hashtags = Some("#gaming #memes".to_string());
        assert_eq!(job.publish_caption(), "hello\n\n#gaming #memes");

        job.caption = None;
        assert_eq!(job.publish_caption(), "#gaming #memes");
    }
}
