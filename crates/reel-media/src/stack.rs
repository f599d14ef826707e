//! Vertical stack composition.
//!
//! Combines two clips into one 1080x1920 reel: the first clip scaled to
//! the top half, the second below it, audio taken from the top clip, with
//! an optional caption burned in across the seam.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::validate_input;

/// Target reel width.
pub const REEL_WIDTH: u32 = 1080;
/// Target reel height (9:16).
pub const REEL_HEIGHT: u32 = 1920;

/// Minimum accepted input duration.
pub const MIN_INPUT_DURATION_SECS: f64 = 1.0;
/// Maximum accepted input duration.
pub const MAX_INPUT_DURATION_SECS: f64 = 90.0;
/// Maximum accepted input file size.
pub const MAX_INPUT_SIZE_BYTES: u64 = 100 * 1024 * 1024;
/// Output duration cap.
const MAX_OUTPUT_DURATION_SECS: f64 = 60.0;

/// A stack composition request.
#[derive(Debug, Clone)]
pub struct StackRequest {
    /// Top clip
    pub input_a: PathBuf,
    /// Bottom clip
    pub input_b: PathBuf,
    /// Output path
    pub output: PathBuf,
    /// Caption to burn in, if any
    pub caption: Option<String>,
    /// Encode wall-clock bound in seconds
    pub timeout_secs: u64,
}

impl StackRequest {
    pub fn new(
        input_a: impl AsRef<Path>,
        input_b: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Self {
        Self {
            input_a: input_a.as_ref().to_path_buf(),
            input_b: input_b.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            caption: None,
            timeout_secs: 300,
        }
    }

    pub fn with_caption(mut self, caption: Option<String>) -> Self {
        self.caption = caption.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Build the filter graph for the stacked reel.
fn build_stack_filter(caption: Option<&str>) -> String {
    let mut filter = concat!(
        "[0:v]scale=1080:-2,setsar=1[top];",
        "[1:v]scale=1080:-2,setsar=1[bottom];",
        "[top]pad=1080:ih+10:0:0:black[top_pad];",
        "[top_pad][bottom]vstack=inputs=2[stacked];",
        "[stacked]scale=1080:1920:force_original_aspect_ratio=decrease,",
        "pad=1080:1920:(ow-iw)/2:(oh-ih)/2:black[reel]"
    )
    .to_string();

    if let Some(caption) = caption {
        filter.push_str(&format!(
            ";[reel]drawtext=text='{}':fontcolor=white:fontsize=56:borderw=3:bordercolor=black:x=(w-text_w)/2:y=(h-text_h)/2[labeled]",
            escape_drawtext(caption)
        ));
    }

    filter
}

/// Escape a caption for use inside a single-quoted drawtext argument.
fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            ':' => escaped.push_str("\\:"),
            '%' => escaped.push_str("\\%"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Stack two clips vertically into one reel.
///
/// Probes and validates both inputs, clamps the output to the shorter
/// clip (capped at 60s), and reports encode progress as a 0-100
/// percentage of the output duration.
pub async fn stack_videos<F>(req: &StackRequest, on_progress: F) -> MediaResult<()>
where
    F: Fn(u8) + Send + Sync + 'static,
{
    let info_a = validate_input(&req.input_a, "top clip").await?;
    let info_b = validate_input(&req.input_b, "bottom clip").await?;

    let duration = info_a
        .duration
        .min(info_b.duration)
        .min(MAX_OUTPUT_DURATION_SECS);
    let duration_ms = (duration * 1000.0) as i64;

    info!(
        output = %req.output.display(),
        duration_secs = duration,
        "Stacking clips"
    );

    let has_caption = req.caption.is_some();
    let cmd = FfmpegCommand::new(&req.output)
        .input(&req.input_a)
        .input(&req.input_b)
        .filter_complex(build_stack_filter(req.caption.as_deref()))
        .map(if has_caption { "[labeled]" } else { "[reel]" })
        .map("0:a?")
        .video_codec("libx264")
        .preset("medium")
        .crf(23)
        .output_args(["-profile:v", "high", "-level", "4.2"])
        .output_args(["-pix_fmt", "yuv420p", "-movflags", "+faststart"])
        .audio_codec("aac")
        .audio_bitrate("128k")
        .output_args(["-ar", "44100"])
        .duration(duration);

    FfmpegRunner::new()
        .with_timeout(req.timeout_secs)
        .run_with_progress(&cmd, move |progress| {
            let pct = progress.percentage(duration_ms) as u8;
            on_progress(pct);
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_filter_without_caption() {
        let filter = build_stack_filter(None);
        assert!(filter.contains("vstack=inputs=2"));
        assert!(filter.ends_with("[reel]"));
        assert!(!filter.contains("drawtext"));
    }

    #[test]
    fn test_stack_filter_with_caption() {
        let filter = build_stack_filter(Some("hello world"));
        assert!(filter.contains("drawtext=text='hello world'"));
        assert!(filter.ends_with("[labeled]"));
    }

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("plain"), "plain");
        assert_eq!(escape_drawtext("50% off: now"), "50\\% off\\: now");
        assert_eq!(escape_drawtext("it's"), "it\\'s");
        assert_eq!(escape_drawtext("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_request_drops_blank_caption() {
        let req = StackRequest::new("a.mp4", "b.mp4", "out.mp4")
            .with_caption(Some("   ".to_string()));
        assert!(req.caption.is_none());
    }
}
