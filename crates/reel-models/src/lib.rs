//! Shared data models for the Reelstack backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs and their lifecycle states
//! - Backup mirror sub-records
//! - Publish sub-records for the Reels container protocol

pub mod backup;
pub mod job;
pub mod publish;

// Re-export common types
pub use backup::{BackupGroup, BackupRecord, BackupStatus, BACKUP_INPUT_A, BACKUP_INPUT_B, BACKUP_OUTPUT};
pub use job::{FailureKind, Job, JobFailure, JobId, JobInputs, JobStatus};
pub use publish::{PublishRecord, PublishStatus};
