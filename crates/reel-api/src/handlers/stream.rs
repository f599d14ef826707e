//! Byte-range streaming and download of finished artifacts.

use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use reel_models::{JobId, JobStatus};

use crate::error::{ApiError, ApiResult};
use crate::handlers::status::is_valid_job_id;
use crate::state::AppState;

/// GET /api/jobs/:job_id/stream
///
/// Stream the composed reel with HTTP range support, so large outputs can
/// be previewed without a full download.
pub async fn stream_output(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let output = finished_output(&state, &job_id).await?;
    serve_file_range(&output, range_header(&headers).as_deref(), None).await
}

/// GET /api/jobs/:job_id/download
///
/// Download the composed reel as an attachment.
pub async fn download_output(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let output = finished_output(&state, &job_id).await?;
    let filename = format!("reel_{}.mp4", job_id);
    serve_file_range(&output, range_header(&headers).as_deref(), Some(&filename)).await
}

/// GET /videos/:filename
///
/// Publicly serve a finished artifact from the output directory. The
/// publish fallback URL points here when no mirrored copy exists.
pub async fn serve_video(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ApiError::bad_request("Invalid file name"));
    }

    let path = state.config.output_dir.join(&filename);
    serve_file_range(&path, range_header(&headers).as_deref(), None).await
}

/// Resolve a job's finished output path.
async fn finished_output(state: &AppState, job_id: &str) -> ApiResult<std::path::PathBuf> {
    if !is_valid_job_id(job_id) {
        return Err(ApiError::bad_request("Invalid job ID format"));
    }

    let job = state
        .store
        .get(&JobId::from_string(job_id))
        .await
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if job.status != JobStatus::Done {
        return Err(ApiError::not_found("Output not ready"));
    }

    job.output
        .ok_or_else(|| ApiError::not_found("Output not ready"))
}

fn range_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Serve a local file, honoring a byte-range request when one parses.
async fn serve_file_range(
    path: &FsPath,
    range: Option<&str>,
    attachment: Option<&str>,
) -> ApiResult<Response> {
    let (bytes, total, window) = read_file_range(path, range).await?;

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .header(header::CONTENT_LENGTH, bytes.len());

    if let Some(name) = attachment {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        );
    }

    builder = match window {
        Some((start, end)) => builder.status(StatusCode::PARTIAL_CONTENT).header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, end, total),
        ),
        None => builder.status(StatusCode::OK),
    };

    builder
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// Read a file, or exactly the requested byte window of it.
///
/// Returns the bytes, the file's total length, and the resolved window
/// when a range applied. A range that does not parse or cannot be
/// satisfied falls back to the full file.
pub(crate) async fn read_file_range(
    path: &FsPath,
    range: Option<&str>,
) -> ApiResult<(Vec<u8>, u64, Option<(u64, u64)>)> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|_| ApiError::not_found("File not found"))?;
    let total = meta.len();

    match range.and_then(|h| parse_range(h, total)) {
        Some((start, end)) => {
            let mut file = tokio::fs::File::open(path)
                .await
                .map_err(|_| ApiError::not_found("File not found"))?;
            file.seek(std::io::SeekFrom::Start(start))
                .await
                .map_err(|e| ApiError::internal(format!("Seek failed: {}", e)))?;

            let len = (end - start + 1) as usize;
            let mut bytes = vec![0u8; len];
            file.read_exact(&mut bytes)
                .await
                .map_err(|e| ApiError::internal(format!("Read failed: {}", e)))?;

            Ok((bytes, total, Some((start, end))))
        }
        None => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|_| ApiError::not_found("File not found"))?;
            Ok((bytes, total, None))
        }
    }
}

/// Parse a `bytes=start-end` header against a known total length.
///
/// Supports `start-end`, open-ended `start-`, and suffix `-n` forms.
/// Returns an inclusive window, clamped to the file, or `None` when the
/// spec does not parse or cannot be satisfied.
pub(crate) fn parse_range(header: &str, total: u64) -> Option<(u64, u64)> {
    let spec = header.strip_prefix("bytes=")?;
    let (start_s, end_s) = spec.split_once('-')?;

    if start_s.is_empty() {
        // Suffix form: last n bytes
        let n: u64 = end_s.parse().ok()?;
        if n == 0 || total == 0 {
            return None;
        }
        let n = n.min(total);
        return Some((total - n, total - 1));
    }

    let start: u64 = start_s.parse().ok()?;
    if start >= total {
        return None;
    }

    let end = if end_s.is_empty() {
        total - 1
    } else {
        end_s.parse::<u64>().ok()?.min(total - 1)
    };

    (start <= end).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_forms() {
        assert_eq!(parse_range("bytes=0-99", 300), Some((0, 99)));
        assert_eq!(parse_range("bytes=100-199", 300), Some((100, 199)));
        assert_eq!(parse_range("bytes=250-", 300), Some((250, 299)));
        assert_eq!(parse_range("bytes=-50", 300), Some((250, 299)));
        // Clamped to the file end
        assert_eq!(parse_range("bytes=200-999", 300), Some((200, 299)));
    }

    #[test]
    fn test_parse_range_unsatisfiable() {
        assert_eq!(parse_range("bytes=300-350", 300), None);
        assert_eq!(parse_range("bytes=-0", 300), None);
        assert_eq!(parse_range("bytes=9-1", 300), None);
        assert_eq!(parse_range("items=0-1", 300), None);
        assert_eq!(parse_range("bytes=abc-def", 300), None);
    }

    #[tokio::test]
    async fn test_adjacent_windows_are_disjoint_and_contiguous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.mp4");
        let content: Vec<u8> = (0..300u16).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, &content).await.unwrap();

        let (first, total_a, window_a) =
            read_file_range(&path, Some("bytes=0-99")).await.unwrap();
        let (second, total_b, window_b) =
            read_file_range(&path, Some("bytes=100-199")).await.unwrap();

        assert_eq!(total_a, 300);
        assert_eq!(total_b, 300);
        assert_eq!(window_a, Some((0, 99)));
        assert_eq!(window_b, Some((100, 199)));
        assert_eq!(first.len(), 100);
        assert_eq!(second.len(), 100);

        // The two slices are contiguous and sum to the first 200 bytes
        let mut joined = first.clone();
        joined.extend_from_slice(&second);
        assert_eq!(joined, content[..200].to_vec());
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_full_read_without_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.mp4");
        tokio::fs::write(&path, b"0123456789").await.unwrap();

        let (bytes, total, window) = read_file_range(&path, None).await.unwrap();
        assert_eq!(total, 10);
        assert_eq!(bytes, b"0123456789");
        assert!(window.is_none());
    }
}
