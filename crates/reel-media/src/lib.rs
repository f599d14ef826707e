//! FFmpeg CLI wrapper for reel composition.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building for multi-input filter graphs
//! - Progress parsing from `-progress pipe:2`
//! - Input probing and validation via ffprobe
//! - The vertical stack composition operation

pub mod command;
pub mod error;
pub mod probe;
pub mod progress;
pub mod stack;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, validate_input, VideoInfo};
pub use progress::{EncodeProgress, ProgressCallback};
pub use stack::{stack_videos, StackRequest, MAX_INPUT_DURATION_SECS, MAX_INPUT_SIZE_BYTES};
