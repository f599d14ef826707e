//! Stage seams for the job pipeline.
//!
//! The orchestrator drives these traits rather than the concrete crates
//! so each stage can be faked in tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use reel_media::MediaResult;
use reel_models::{BackupGroup, JobId};
use reel_publish::{PublishResult, PublishedMedia};
use reel_storage::StorageResult;

/// Progress notifications from the composition stage, 0-100.
///
/// Implementations must never block: updates are coalesced on their way
/// into the store.
pub type ProgressHook = Arc<dyn Fn(u8) + Send + Sync>;

/// The composition stage. Its failure is the only one fatal to a job.
#[async_trait]
pub trait Composer: Send + Sync {
    /// Compose the two clips into one artifact and return its path.
    async fn compose(
        &self,
        input_a: &Path,
        input_b: &Path,
        caption: Option<&str>,
        on_progress: ProgressHook,
    ) -> MediaResult<PathBuf>;
}

/// The backup mirror. Best-effort: failure never fails the job.
#[async_trait]
pub trait BackupStore: Send + Sync {
    /// Verify the store is reachable with the configured credential.
    /// Failure here means the whole stage is skipped, not failed.
    async fn check_access(&self) -> StorageResult<()>;

    /// Upload one file under the job-scoped container and return its
    /// publicly fetchable URL.
    async fn upload(
        &self,
        job_id: &JobId,
        group: BackupGroup,
        name: &str,
        path: &Path,
    ) -> StorageResult<String>;
}

/// The publish stage: full container create / poll / publish protocol.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish the video at a publicly reachable URL with a caption.
    async fn publish(&self, video_url: &str, caption: &str) -> PublishResult<PublishedMedia>;
}
