//! Job status handlers for progress polling.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use reel_models::{BackupRecord, Job, JobId, JobStatus, PublishRecord};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Job status response.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    /// Job ID
    pub job_id: String,
    /// Current status: queued, processing, done, error
    pub status: String,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Current activity description
    pub message: String,
    /// Stable error kind, when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Error detail, when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Backup mirror sub-record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupRecord>,
    /// Publish sub-record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishRecord>,
    /// Opaque handle to the finished artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_ref: Option<String>,
    /// Streaming URL, once done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    /// Download URL, once done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// When the job was created
    pub created_at: String,
    /// When the primary lifecycle settled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_at: Option<String>,
}

impl JobStatusResponse {
    fn from_job(job: Job) -> Self {
        let output_ref = job
            .output
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string());

        let (preview_url, download_url) = if job.status == JobStatus::Done {
            (
                Some(format!("/api/jobs/{}/stream", job.id)),
                Some(format!("/api/jobs/{}/download", job.id)),
            )
        } else {
            (None, None)
        };

        Self {
            job_id: job.id.to_string(),
            status: job.status.as_str().to_string(),
            progress: job.progress,
            message: job.message,
            error_kind: job.error.as_ref().map(|e| e.kind.as_str().to_string()),
            error: job.error.map(|e| e.detail),
            backup: job.backup,
            publish: job.publish,
            output_ref,
            preview_url,
            download_url,
            created_at: job.created_at.to_rfc3339(),
            terminal_at: job.terminal_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// GET /api/jobs/:job_id
///
/// Poll the current status snapshot of a job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    if !is_valid_job_id(&job_id) {
        return Err(ApiError::bad_request("Invalid job ID format"));
    }

    let job = state
        .store
        .get(&JobId::from_string(job_id))
        .await
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(JobStatusResponse::from_job(job)))
}

/// Cancellation response.
#[derive(Serialize)]
pub struct CancelResponse {
    pub job_id: String,
    pub cancel_requested: bool,
}

/// POST /api/jobs/:job_id/cancel
///
/// Best-effort cooperative cancellation: the signal is checked between
/// stages, a stage already in flight is not interrupted.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<(StatusCode, Json<CancelResponse>)> {
    if !is_valid_job_id(&job_id) {
        return Err(ApiError::bad_request("Invalid job ID format"));
    }

    let id = JobId::from_string(job_id.clone());
    state
        .orchestrator
        .cancel(&id)
        .await
        .map_err(|_| ApiError::not_found("Job not found"))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CancelResponse {
            job_id,
            cancel_requested: true,
        }),
    ))
}

/// Validate job ID format to keep arbitrary strings out of lookups.
///
/// Valid format: alphanumeric characters and hyphens only, 8-64 chars.
pub(crate) fn is_valid_job_id(id: &str) -> bool {
    if id.len() < 8 || id.len() > 64 {
        return false;
    }
    id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_job_ids() {
        assert!(is_valid_job_id("12345678"));
        assert!(is_valid_job_id("550e8400-e29b-41d4-a716-446655440000"));
    }

    #[test]
    fn test_invalid_job_ids() {
        assert!(!is_valid_job_id(""));
        assert!(!is_valid_job_id("short"));
        assert!(!is_valid_job_id("has space"));
        assert!(!is_valid_job_id("has_underscore"));
        assert!(!is_valid_job_id(&"a".repeat(65)));
    }
}
