//! Job orchestrator state machine.
//!
//! `submit` creates a job and returns its id immediately; each job then
//! runs on its own tokio task, sequencing composition (mandatory), then
//! backup and publish (both best-effort). Only composition failures touch
//! the job's primary status; the tail stages record their outcome in
//! their own sub-records and are swallowed at the stage boundary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;
use tokio::fs;
use tracing::{debug, info, warn};

use reel_models::{
    BackupGroup, BackupRecord, FailureKind, Job, JobFailure, JobId, JobInputs, PublishRecord,
    BACKUP_INPUT_A, BACKUP_INPUT_B, BACKUP_OUTPUT,
};
use reel_publish::PublishError;

use crate::error::{StoreError, SubmitError};
use crate::progress::progress_tap;
use crate::stages::{BackupStore, Composer, Publisher};
use crate::store::JobStore;

const JOBS_SUBMITTED: &str = "reelstack_jobs_submitted_total";
const JOBS_COMPLETED: &str = "reelstack_jobs_completed_total";
const JOBS_FAILED: &str = "reelstack_jobs_failed_total";
const PUBLISH_FAILED: &str = "reelstack_publish_failed_total";

/// A validated submission.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// Top clip, already persisted to local disk
    pub input_a: PathBuf,
    /// Bottom clip, already persisted to local disk
    pub input_b: PathBuf,
    /// Caption for burn-in and publishing
    pub caption: Option<String>,
    /// Hashtags appended to the caption when publishing
    pub hashtags: Option<String>,
}

/// The orchestrator: owns the stage implementations and schedules one
/// background task per job.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<JobStore>,
    composer: Arc<dyn Composer>,
    backup: Option<Arc<dyn BackupStore>>,
    publisher: Option<Arc<dyn Publisher>>,
    public_video_base: Option<String>,
}

impl Orchestrator {
    /// Create an orchestrator with the mandatory composition stage.
    pub fn new(store: Arc<JobStore>, composer: Arc<dyn Composer>) -> Self {
        Self {
            store,
            composer,
            backup: None,
            publisher: None,
            public_video_base: None,
        }
    }

    /// Attach the backup mirror. `None` reports the stage as skipped.
    pub fn with_backup(mut self, backup: Option<Arc<dyn BackupStore>>) -> Self {
        self.backup = backup;
        self
    }

    /// Attach the publisher. `None` reports the stage as skipped.
    pub fn with_publisher(mut self, publisher: Option<Arc<dyn Publisher>>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Base URL under which finished artifacts are locally served; the
    /// publish fallback when no mirrored copy exists.
    pub fn with_public_video_base(mut self, base: Option<String>) -> Self {
        self.public_video_base = base.map(|b| b.trim_end_matches('/').to_string());
        self
    }

    /// The job record store backing this orchestrator.
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Accept a new job. Validates input presence, creates the record,
    /// schedules background execution, and returns the id without
    /// blocking on any stage.
    pub async fn submit(&self, request: SubmitRequest) -> Result<JobId, SubmitError> {
        for (label, path) in [("input_a", &request.input_a), ("input_b", &request.input_b)] {
            match fs::metadata(path).await {
                Ok(meta) if meta.is_file() => {}
                _ => {
                    return Err(SubmitError::validation(format!(
                        "{} is missing or not a file",
                        label
                    )))
                }
            }
        }

        let job = Job::new(
            JobInputs {
                input_a: request.input_a,
                input_b: request.input_b,
            },
            request.caption,
            request.hashtags,
        );
        let job_id = self.store.insert(job).await;

        counter!(JOBS_SUBMITTED).increment(1);
        info!(job_id = %job_id, "Job submitted");

        let this = self.clone();
        let id = job_id.clone();
        tokio::spawn(async move {
            this.run(id).await;
        });

        Ok(job_id)
    }

    /// Best-effort cooperative cancellation, checked between stages. A
    /// stage already in flight is not interrupted.
    pub async fn cancel(&self, id: &JobId) -> Result<(), StoreError> {
        info!(job_id = %id, "Cancel requested");
        self.store
            .update(id, |job| {
                job.cancel_requested = true;
            })
            .await
    }

    /// Background execution for one job.
    async fn run(self, job_id: JobId) {
        let Some(job) = self.store.get(&job_id).await else {
            warn!(job_id = %job_id, "Job vanished before processing started");
            return;
        };

        let Some(inputs) = job.inputs.clone() else {
            let _ = self
                .store
                .update(&job_id, |job| {
                    job.fail(JobFailure::new(FailureKind::Validation, "input clips missing"))
                })
                .await;
            return;
        };

        if job.cancel_requested {
            info!(job_id = %job_id, "Job cancelled before processing");
            let _ = self
                .store
                .update(&job_id, |job| {
                    job.fail(JobFailure::new(
                        FailureKind::Cancelled,
                        "cancelled before processing",
                    ))
                })
                .await;
            remove_files([&inputs.input_a, &inputs.input_b]).await;
            return;
        }

        if self
            .store
            .update(&job_id, |job| {
                job.start();
                job.message = "Compositing clips".to_string();
                job.set_progress(5);
            })
            .await
            .is_err()
        {
            warn!(job_id = %job_id, "Job vanished before composition");
            remove_files([&inputs.input_a, &inputs.input_b]).await;
            return;
        }

        let (hook, _tap) = progress_tap(Arc::clone(&self.store), job_id.clone());
        let compose_result = self
            .composer
            .compose(
                &inputs.input_a,
                &inputs.input_b,
                job.caption.as_deref(),
                hook,
            )
            .await;

        let output = match compose_result {
            Ok(output) => output,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Composition failed");
                counter!(JOBS_FAILED).increment(1);
                let _ = self
                    .store
                    .update(&job_id, |job| {
                        job.fail(JobFailure::new(FailureKind::Composition, e.to_string()))
                    })
                    .await;
                remove_files([&inputs.input_a, &inputs.input_b]).await;
                return;
            }
        };

        // The artifact exists and is usable: the job is done now, whatever
        // the tail stages do.
        if self
            .store
            .update(&job_id, |job| job.complete(output.clone()))
            .await
            .is_err()
        {
            warn!(job_id = %job_id, "Job vanished after composition, discarding artifact");
            remove_files([&inputs.input_a, &inputs.input_b, &output]).await;
            return;
        }
        counter!(JOBS_COMPLETED).increment(1);
        info!(job_id = %job_id, output = %output.display(), "Job completed");

        // Cancellation between stages skips the optional tail.
        let cancelled = self
            .store
            .get(&job_id)
            .await
            .map(|j| j.cancel_requested)
            .unwrap_or(true);
        if cancelled {
            remove_files([&inputs.input_a, &inputs.input_b]).await;
            let _ = self
                .store
                .update(&job_id, |job| {
                    job.backup.get_or_insert_with(BackupRecord::skipped);
                    job.publish.get_or_insert_with(PublishRecord::skipped);
                    job.inputs = None;
                })
                .await;
            return;
        }

        let mirrored_output = self.run_backup(&job_id, &inputs, &output).await;
        self.run_publish(&job_id, mirrored_output, &output).await;

        // Inputs are no longer needed once the mirror has seen them.
        remove_files([&inputs.input_a, &inputs.input_b]).await;
        let _ = self
            .store
            .update(&job_id, |job| {
                job.inputs = None;
                if job.message == "Mirroring artifacts" || job.message == "Publishing reel" {
                    job.message = "Completed".to_string();
                }
            })
            .await;
    }

    /// Best-effort mirror of the two inputs and the output. Returns the
    /// mirrored output URL when that upload succeeded.
    async fn run_backup(
        &self,
        job_id: &JobId,
        inputs: &JobInputs,
        output: &Path,
    ) -> Option<String> {
        let Some(backup) = self.backup.as_ref() else {
            let _ = self
                .store
                .update(job_id, |job| {
                    job.backup = Some(BackupRecord::skipped());
                })
                .await;
            return None;
        };

        if let Err(e) = backup.check_access().await {
            warn!(job_id = %job_id, error = %e, "Backup store unavailable, skipping mirror");
            let _ = self
                .store
                .update(job_id, |job| {
                    let mut rec = BackupRecord::skipped();
                    rec.error = Some(e.to_string());
                    job.backup = Some(rec);
                })
                .await;
            return None;
        }

        if self
            .store
            .update(job_id, |job| {
                job.backup = Some(BackupRecord::uploading());
                job.message = "Mirroring artifacts".to_string();
            })
            .await
            .is_err()
        {
            warn!(job_id = %job_id, "Job vanished before mirroring");
            return None;
        }

        let name_a = mirror_name(BACKUP_INPUT_A, &inputs.input_a);
        let name_b = mirror_name(BACKUP_INPUT_B, &inputs.input_b);

        // The three uploads are independent: one failing never blocks the
        // others, and every success is merged as it lands.
        let (_, _, mirrored_output) = tokio::join!(
            self.mirror_one(
                job_id,
                backup,
                BackupGroup::Inputs,
                BACKUP_INPUT_A,
                &name_a,
                &inputs.input_a
            ),
            self.mirror_one(
                job_id,
                backup,
                BackupGroup::Inputs,
                BACKUP_INPUT_B,
                &name_b,
                &inputs.input_b
            ),
            self.mirror_one(
                job_id,
                backup,
                BackupGroup::Final,
                BACKUP_OUTPUT,
                "output.mp4",
                output
            ),
        );

        let _ = self
            .store
            .update(job_id, |job| {
                if let Some(rec) = job.backup.as_mut() {
                    rec.settle(3);
                }
            })
            .await;

        mirrored_output
    }

    /// Upload one file and merge its link into the backup record.
    async fn mirror_one(
        &self,
        job_id: &JobId,
        backup: &Arc<dyn BackupStore>,
        group: BackupGroup,
        logical: &str,
        name: &str,
        path: &Path,
    ) -> Option<String> {
        match backup.upload(job_id, group, name, path).await {
            Ok(url) => {
                let _ = self
                    .store
                    .update(job_id, |job| {
                        if let Some(rec) = job.backup.as_mut() {
                            rec.merge_link(logical, url.clone());
                        }
                    })
                    .await;
                Some(url)
            }
            Err(e) => {
                warn!(job_id = %job_id, file = logical, error = %e, "Backup upload failed");
                let _ = self
                    .store
                    .update(job_id, |job| {
                        if let Some(rec) = job.backup.as_mut() {
                            rec.error = Some(e.to_string());
                        }
                    })
                    .await;
                None
            }
        }
    }

    /// Publish the finished reel when a publisher and a public URL source
    /// are both available; otherwise record the stage as skipped.
    async fn run_publish(&self, job_id: &JobId, mirrored_url: Option<String>, output: &Path) {
        let Some(publisher) = self.publisher.as_ref() else {
            let _ = self
                .store
                .update(job_id, |job| {
                    job.publish = Some(PublishRecord::skipped());
                })
                .await;
            return;
        };

        // The platform fetches the video itself, so publishing is only
        // attempted against a publicly reachable location.
        let public_url = mirrored_url.or_else(|| {
            self.public_video_base.as_ref().and_then(|base| {
                output
                    .file_name()
                    .map(|name| format!("{}/{}", base, name.to_string_lossy()))
            })
        });

        let Some(public_url) = public_url else {
            info!(job_id = %job_id, "No public URL source, skipping publish");
            let _ = self
                .store
                .update(job_id, |job| {
                    job.publish = Some(PublishRecord::skipped());
                })
                .await;
            return;
        };

        let Some(job) = self.store.get(job_id).await else {
            warn!(job_id = %job_id, "Job vanished before publish");
            return;
        };
        let caption = job.publish_caption();

        if self
            .store
            .update(job_id, |job| {
                job.publish = Some(PublishRecord::uploading());
                job.message = "Publishing reel".to_string();
            })
            .await
            .is_err()
        {
            warn!(job_id = %job_id, "Job vanished before publish");
            return;
        }

        match publisher.publish(&public_url, &caption).await {
            Ok(media) => {
                info!(job_id = %job_id, media_id = %media.media_id, "Reel published");
                let _ = self
                    .store
                    .update(job_id, |job| {
                        job.publish = Some(PublishRecord::success(media.media_id, media.permalink));
                    })
                    .await;
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Publish failed");
                counter!(PUBLISH_FAILED).increment(1);
                // Keep the platform's reason verbatim where we have one
                let detail = match e {
                    PublishError::Rejected(msg) | PublishError::Platform(msg) => msg,
                    other => other.to_string(),
                };
                let _ = self
                    .store
                    .update(job_id, |job| {
                        job.publish = Some(PublishRecord::failed(detail));
                    })
                    .await;
            }
        }
    }
}

/// Logical mirror file name keeping the stored clip's extension.
fn mirror_name(logical: &str, path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "mp4".to_string());
    format!("{}.{}", logical, ext)
}

/// Best-effort removal of temporary files.
async fn remove_files<'a, I>(paths: I)
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    for path in paths {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %e, "Failed to remove temp file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_name_keeps_extension() {
        assert_eq!(
            mirror_name(BACKUP_INPUT_A, Path::new("/tmp/u/9fd3.MOV")),
            "input_a.mov"
        );
        assert_eq!(
            mirror_name(BACKUP_INPUT_B, Path::new("/tmp/u/9fd3")),
            "input_b.mp4"
        );
    }
}
