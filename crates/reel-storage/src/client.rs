//! Backup store client implementation.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Configuration for the backup store client.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region (usually "auto" for R2)
    pub region: String,
    /// Public bucket domain; objects are addressable there without signing
    pub public_base_url: Option<String>,
    /// Presigned URL lifetime when no public domain is configured
    pub url_expiry: Duration,
}

impl BackupConfig {
    /// Create config from environment variables.
    ///
    /// Returns `ConfigError` when the mirror is not configured; callers
    /// treat that as "skip the backup stage", not as a startup failure.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("BACKUP_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("BACKUP_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("BACKUP_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("BACKUP_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("BACKUP_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("BACKUP_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("BACKUP_BUCKET")
                .map_err(|_| StorageError::config_error("BACKUP_BUCKET not set"))?,
            region: std::env::var("BACKUP_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("BACKUP_PUBLIC_BASE_URL")
                .ok()
                .map(|s| s.trim_end_matches('/').to_string()),
            url_expiry: Duration::from_secs(
                std::env::var("BACKUP_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(86_400),
            ),
        })
    }
}

/// Backup store client over an S3-compatible bucket.
#[derive(Clone)]
pub struct BackupClient {
    client: Client,
    bucket: String,
    public_base_url: Option<String>,
    url_expiry: Duration,
}

impl BackupClient {
    /// Create a new client from configuration.
    pub fn new(config: BackupConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "backup",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_base_url: config.public_base_url,
            url_expiry: config.url_expiry,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(BackupConfig::from_env()?))
    }

    /// Upload a file to the bucket.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Generate a presigned URL for GET.
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// Resolve a publicly fetchable URL for an object: the public bucket
    /// domain when configured, otherwise a presigned GET.
    pub async fn get_url(&self, key: &str) -> StorageResult<String> {
        if let Some(base) = &self.public_base_url {
            return Ok(format!("{}/{}", base, key));
        }
        self.presign_get(key, self.url_expiry).await
    }

    /// Check if an object exists.
    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.to_string().contains("NotFound") || e.to_string().contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(StorageError::AwsSdk(e.to_string()))
                }
            }
        }
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("Backup store connectivity check failed: {}", e)))?;
        Ok(())
    }
}
