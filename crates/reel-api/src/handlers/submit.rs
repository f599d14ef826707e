//! Job submission handler.

use std::path::PathBuf;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use reel_jobs::SubmitRequest;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Accepted upload extensions.
const ALLOWED_EXTENSIONS: [&str; 5] = ["mp4", "mov", "avi", "mkv", "webm"];

/// Submission response.
#[derive(Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
}

/// POST /api/jobs
///
/// Accepts a multipart form with two clips and an optional caption,
/// creates a job, and returns its id immediately. No processing happens
/// synchronously.
///
/// Fields:
/// - `input_a`: top clip (required)
/// - `input_b`: bottom clip (required)
/// - `caption`: text burned into the reel and used when publishing
/// - `hashtags`: appended to the caption when publishing
pub async fn submit_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let mut saved: Vec<PathBuf> = Vec::new();

    let result = collect_submission(&state, multipart, &mut saved).await;

    let request = match result {
        Ok(request) => request,
        Err(e) => {
            // Don't leave half-uploaded files behind on a rejected request
            for path in saved {
                let _ = tokio::fs::remove_file(path).await;
            }
            return Err(e);
        }
    };

    let job_id = state.orchestrator.submit(request).await?;

    info!(job_id = %job_id, "Accepted submission");
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id: job_id.to_string(),
        }),
    ))
}

/// Parse the multipart form into a validated submission.
async fn collect_submission(
    state: &AppState,
    mut multipart: Multipart,
    saved: &mut Vec<PathBuf>,
) -> ApiResult<SubmitRequest> {
    let mut input_a = None;
    let mut input_b = None;
    let mut caption = None;
    let mut hashtags = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("input_a") => {
                let path = save_upload(state, field, "input_a").await?;
                saved.push(path.clone());
                input_a = Some(path);
            }
            Some("input_b") => {
                let path = save_upload(state, field, "input_b").await?;
                saved.push(path.clone());
                input_b = Some(path);
            }
            Some("caption") => {
                caption = Some(read_text(field, "caption").await?);
            }
            Some("hashtags") => {
                hashtags = Some(read_text(field, "hashtags").await?);
            }
            _ => {}
        }
    }

    let input_a = input_a.ok_or_else(|| ApiError::validation("input_a video is required"))?;
    let input_b = input_b.ok_or_else(|| ApiError::validation("input_b video is required"))?;

    Ok(SubmitRequest {
        input_a,
        input_b,
        caption: caption.filter(|c: &String| !c.trim().is_empty()),
        hashtags: hashtags.filter(|h: &String| !h.trim().is_empty()),
    })
}

/// Persist one uploaded clip under a fresh name in the upload dir.
async fn save_upload(
    state: &AppState,
    field: axum::extract::multipart::Field<'_>,
    label: &str,
) -> ApiResult<PathBuf> {
    let filename = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| ApiError::validation(format!("{} must be a file upload", label)))?;

    let ext = allowed_extension(&filename).ok_or_else(|| {
        ApiError::validation(format!("{}: unsupported video format", label))
    })?;

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read {}: {}", label, e)))?;

    if data.is_empty() {
        return Err(ApiError::validation(format!("{} is empty", label)));
    }

    let path = state
        .config
        .upload_dir
        .join(format!("{}_{}.{}", label, Uuid::new_v4().simple(), ext));

    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to persist upload: {}", e)))?;

    Ok(path)
}

/// Read a short text field.
async fn read_text(field: axum::extract::multipart::Field<'_>, label: &str) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read {}: {}", label, e)))
}

/// Match the upload's extension against the allowlist.
fn allowed_extension(filename: &str) -> Option<String> {
    let ext = filename.rsplit_once('.')?.1.to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extension() {
        assert_eq!(allowed_extension("clip.mp4"), Some("mp4".to_string()));
        assert_eq!(allowed_extension("CLIP.MOV"), Some("mov".to_string()));
        assert_eq!(allowed_extension("archive.tar.webm"), Some("webm".to_string()));
        assert_eq!(allowed_extension("script.sh"), None);
        assert_eq!(allowed_extension("noext"), None);
    }
}
