//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size (multipart uploads)
    pub max_body_size: usize,
    /// Directory for uploaded source clips
    pub upload_dir: PathBuf,
    /// Directory for composed artifacts
    pub output_dir: PathBuf,
    /// Public base URL under which artifacts are served; publish fallback
    pub public_video_base: Option<String>,
    /// FFmpeg encode wall-clock bound in seconds
    pub encode_timeout_secs: u64,
    /// Terminal job retention window
    pub job_retention: Duration,
    /// Cleanup sweep period
    pub cleanup_interval: Duration,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 500 * 1024 * 1024, // two clips at 100MB each fit well within
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            public_video_base: None,
            encode_timeout_secs: 300,
            job_retention: Duration::from_secs(86_400),
            cleanup_interval: Duration::from_secs(3_600),
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            public_video_base: std::env::var("PUBLIC_VIDEO_URL")
                .ok()
                .map(|s| s.trim_end_matches('/').to_string()),
            encode_timeout_secs: std::env::var("ENCODE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.encode_timeout_secs),
            job_retention: Duration::from_secs(
                std::env::var("JOB_RETENTION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(86_400),
            ),
            cleanup_interval: Duration::from_secs(
                std::env::var("JOB_CLEANUP_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3_600),
            ),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
