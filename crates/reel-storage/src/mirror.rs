//! Job-scoped backup mirror layout.
//!
//! All three files for one job live under `jobs/{job_id}/` with two
//! logical groups, `inputs/` and `final/`, so concurrent jobs never
//! collide and everything for one job browses together.

use std::path::Path;

use reel_models::{BackupGroup, JobId};

use crate::client::BackupClient;
use crate::error::StorageResult;

/// Build the object key for one mirrored file.
pub fn mirror_key(job_id: &JobId, group: BackupGroup, name: &str) -> String {
    format!("jobs/{}/{}/{}", job_id, group.as_str(), name)
}

/// Content type guessed from the file name.
fn content_type_for(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.ends_with(".mp4") || lower.ends_with(".mov") || lower.ends_with(".mkv") {
        "video/mp4"
    } else if lower.ends_with(".webm") {
        "video/webm"
    } else {
        "application/octet-stream"
    }
}

impl BackupClient {
    /// Mirror one file under the job-scoped container and return its
    /// publicly fetchable URL.
    pub async fn mirror_file(
        &self,
        job_id: &JobId,
        group: BackupGroup,
        name: &str,
        path: impl AsRef<Path>,
    ) -> StorageResult<String> {
        let key = mirror_key(job_id, group, name);
        self.upload_file(path, &key, content_type_for(name)).await?;
        self.get_url(&key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_key_layout() {
        let id = JobId::from_string("abc-123");
        assert_eq!(
            mirror_key(&id, BackupGroup::Inputs, "input_a.mp4"),
            "jobs/abc-123/inputs/input_a.mp4"
        );
        assert_eq!(
            mirror_key(&id, BackupGroup::Final, "output.mp4"),
            "jobs/abc-123/final/output.mp4"
        );
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(content_type_for("output.mp4"), "video/mp4");
        assert_eq!(content_type_for("clip.WEBM"), "video/webm");
        assert_eq!(content_type_for("notes.txt"), "application/octet-stream");
    }
}
