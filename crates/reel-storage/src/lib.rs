//! S3-compatible object store client for backup mirroring.
//!
//! This crate provides:
//! - File upload to an R2-style bucket
//! - Public or presigned URL generation for mirrored objects
//! - Job-scoped key layout for the backup mirror

pub mod client;
pub mod error;
pub mod mirror;

pub use client::{BackupClient, BackupConfig};
pub use error::{StorageError, StorageResult};
pub use mirror::mirror_key;
