//! Production adapters binding the stage seams to the media, storage and
//! publish crates.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use reel_media::{stack_videos, MediaResult, StackRequest};
use reel_models::{BackupGroup, JobId};
use reel_publish::{drive_publish, PublishResult, PublishedMedia, ReelsClient};
use reel_storage::{BackupClient, StorageResult};

use crate::stages::{BackupStore, Composer, ProgressHook, Publisher};

/// Composition via the FFmpeg stack operation.
pub struct FfmpegComposer {
    output_dir: PathBuf,
    encode_timeout_secs: u64,
}

impl FfmpegComposer {
    pub fn new(output_dir: impl Into<PathBuf>, encode_timeout_secs: u64) -> Self {
        Self {
            output_dir: output_dir.into(),
            encode_timeout_secs,
        }
    }
}

#[async_trait]
impl Composer for FfmpegComposer {
    async fn compose(
        &self,
        input_a: &Path,
        input_b: &Path,
        caption: Option<&str>,
        on_progress: ProgressHook,
    ) -> MediaResult<PathBuf> {
        let output = self
            .output_dir
            .join(format!("reel_{}.mp4", Uuid::new_v4().simple()));

        let req = StackRequest::new(input_a, input_b, &output)
            .with_caption(caption.map(str::to_string))
            .with_timeout(self.encode_timeout_secs);

        // Hold 100 back for the job-level completion transition
        stack_videos(&req, move |pct| {
            on_progress(5 + (pct.min(100) as u16 * 94 / 100) as u8);
        })
        .await?;

        Ok(output)
    }
}

/// Backup mirroring via the S3-compatible store.
pub struct RemoteMirror {
    client: BackupClient,
}

impl RemoteMirror {
    pub fn new(client: BackupClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BackupStore for RemoteMirror {
    async fn check_access(&self) -> StorageResult<()> {
        self.client.check_connectivity().await
    }

    async fn upload(
        &self,
        job_id: &JobId,
        group: BackupGroup,
        name: &str,
        path: &Path,
    ) -> StorageResult<String> {
        self.client.mirror_file(job_id, group, name, path).await
    }
}

/// Publishing via the Reels Graph API driver.
pub struct ReelsPublisher {
    client: ReelsClient,
}

impl ReelsPublisher {
    pub fn new(client: ReelsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Publisher for ReelsPublisher {
    async fn publish(&self, video_url: &str, caption: &str) -> PublishResult<PublishedMedia> {
        drive_publish(&self.client, video_url, caption).await
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_encode_progress_scaling() {
        // The closure maps raw encoder 0..100 into 5..99
        let scale = |pct: u8| 5 + (pct.min(100) as u16 * 94 / 100) as u8;
        assert_eq!(scale(0), 5);
        assert_eq!(scale(50), 52);
        assert_eq!(scale(100), 99);
        assert_eq!(scale(255), 99);
    }
}
