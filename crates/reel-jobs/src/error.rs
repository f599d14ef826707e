//! Error types for job orchestration.

use reel_models::JobId;
use thiserror::Error;

/// Errors from the job record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The id is not (or no longer) present. A stage hitting this mid-run
    /// is the benign `JobVanished` race: the record was evicted by a
    /// cleanup sweep, and the stage logs and silently stops.
    #[error("Job not found: {0}")]
    NotFound(JobId),
}

/// Errors from job submission, reported before any job is created.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Validation error: {0}")]
    Validation(String),
}

impl SubmitError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
