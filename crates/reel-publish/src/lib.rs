//! Reels Graph API client.
//!
//! This crate provides:
//! - Container creation from a public video URL
//! - Container status polling with an interval and a hard deadline
//! - The final publish call yielding the platform media id and permalink

pub mod client;
pub mod config;
pub mod driver;
pub mod error;

pub use client::{ContainerState, PublishedMedia, ReelsClient};
pub use config::PublishConfig;
pub use driver::drive_publish;
pub use error::{PublishError, PublishResult};
