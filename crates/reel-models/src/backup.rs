//! Backup mirror sub-record.
//!
//! The backup stage is best-effort: any subset of the three files landing
//! in the remote store is a valid partial result, and "never attempted"
//! must stay distinguishable from "attempted and failed".

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Logical name for the first source clip in the mirror.
pub const BACKUP_INPUT_A: &str = "input_a";
/// Logical name for the second source clip in the mirror.
pub const BACKUP_INPUT_B: &str = "input_b";
/// Logical name for the composed artifact in the mirror.
pub const BACKUP_OUTPUT: &str = "output";

/// Logical group under the job-scoped container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BackupGroup {
    /// Source clips
    Inputs,
    /// Composed artifact
    Final,
}

impl BackupGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupGroup::Inputs => "inputs",
            BackupGroup::Final => "final",
        }
    }
}

/// Outcome of the backup stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BackupStatus {
    /// Uploads in flight
    Uploading,
    /// Mirror not configured or credential unusable; nothing was attempted
    Skipped,
    /// All files mirrored
    Success,
    /// Some files mirrored, some failed
    Partial,
    /// No file made it to the store
    Failed,
}

impl BackupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupStatus::Uploading => "uploading",
            BackupStatus::Skipped => "skipped",
            BackupStatus::Success => "success",
            BackupStatus::Partial => "partial",
            BackupStatus::Failed => "failed",
        }
    }
}

/// Backup stage record, populated incrementally and independently of the
/// primary job lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BackupRecord {
    /// Stage outcome
    pub status: BackupStatus,
    /// Logical name -> public URL for each mirrored file
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
    /// Detail of the last upload failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackupRecord {
    /// Record for a stage that was never attempted.
    pub fn skipped() -> Self {
        Self {
            status: BackupStatus::Skipped,
            links: BTreeMap::new(),
            error: None,
        }
    }

    /// Record for a stage with uploads in flight.
    pub fn uploading() -> Self {
        Self {
            status: BackupStatus::Uploading,
            links: BTreeMap::new(),
            error: None,
        }
    }

    /// Merge one finished upload into the record.
    pub fn merge_link(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.links.insert(name.into(), url.into());
    }

    /// Settle the final status from upload counts.
    pub fn settle(&mut self, attempted: usize) {
        self.status = if self.links.is_empty() {
            BackupStatus::Failed
        } else if self.links.len() < attempted {
            BackupStatus::Partial
        } else {
            BackupStatus::Success
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_outcomes() {
        let mut rec = BackupRecord::uploading();
        rec.settle(3);
        assert_eq!(rec.status, BackupStatus::Failed);

        let mut rec = BackupRecord::uploading();
        rec.merge_link(BACKUP_INPUT_A, "https://example.com/a");
        rec.settle(3);
        assert_eq!(rec.status, BackupStatus::Partial);

        let mut rec = BackupRecord::uploading();
        rec.merge_link(BACKUP_INPUT_A, "https://example.com/a");
        rec.merge_link(BACKUP_INPUT_B, "https://example.com/b");
        rec.merge_link(BACKUP_OUTPUT, "https://example.com/out");
        rec.settle(3);
        assert_eq!(rec.status, BackupStatus::Success);
    }

    #[test]
    fn test_skipped_is_distinct_from_failed() {
        assert_ne!(BackupRecord::skipped().status, BackupStatus::Failed);
    }
}
