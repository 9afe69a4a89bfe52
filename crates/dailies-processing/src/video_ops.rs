//! Video renditions and conversions.
//!
//! The thumbnail of a clip is a composite strip of three stills sampled at
//! the first, middle, and near-last frame; the web version is a WebM
//! transcode at a fixed bitrate. All transcoder work runs through
//! [`ToolRunner`]; still intermediates live in a scratch directory that is
//! removed when the render finishes, on success or failure.

use std::path::{Path, PathBuf};

use dailies_core::constants::{H264_BITRATE_KBITS, H264_CODEC};
use dailies_core::{MediaConfig, MediaResult};
use tempfile::TempDir;

use crate::command::{CommandOptions, ToolRunner};
use crate::probe::MediaProber;
use crate::render::rendition_path;

/// Renders clip thumbnails and web transcodes.
#[derive(Debug, Clone)]
pub struct VideoRenderer {
    config: MediaConfig,
    transcoder: ToolRunner,
    prober: MediaProber,
}

impl VideoRenderer {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            transcoder: ToolRunner::new(config.ffmpeg_path.clone(), config.process_timeout),
            prober: MediaProber::new(config),
            config: config.clone(),
        }
    }

    /// Composite thumbnail for `input`: three stills scaled to a third of
    /// the box height and stacked vertically, written into `out_dir`.
    #[tracing::instrument(skip(self), fields(input = %input.display()))]
    pub async fn render_thumbnail(&self, input: &Path, out_dir: &Path) -> MediaResult<PathBuf> {
        let frame_count = self.prober.video_frame_count(input).await?;
        let indices = sample_frame_indices(frame_count);
        tracing::debug!(frame_count, ?indices, "sampling stills");

        let scratch = TempDir::new()?;
        let mut stills = Vec::new();
        for (slot, frame_index) in indices.iter().enumerate() {
            let still = scratch
                .path()
                .join(format!("still_{slot}{}", self.config.thumbnail_format));
            let options = still_options(input, *frame_index, &still);
            self.transcoder.run_transcode(&options).await?;
            stills.push(still.display().to_string());
        }

        tokio::fs::create_dir_all(out_dir).await?;
        let out = rendition_path(input, out_dir, &self.config.thumbnail_format)?;
        let options = self.composite_options(stills, &out);
        self.transcoder.run_transcode(&options).await?;
        Ok(out)
    }

    /// Web rendition for `input`: always re-encoded, whatever the source
    /// codec, so playback needs nothing beyond a browser.
    pub async fn render_web_version(&self, input: &Path, out_dir: &Path) -> MediaResult<PathBuf> {
        tokio::fs::create_dir_all(out_dir).await?;
        let out = rendition_path(input, out_dir, &self.config.web_video_format)?;
        self.convert_to_webm(input, &out, CommandOptions::new())
            .await
    }

    /// Converts `input` to WebM at the configured bitrate. Entries in
    /// `extra` override the defaults; the output extension is forced.
    pub async fn convert_to_webm(
        &self,
        input: &Path,
        output: &Path,
        extra: CommandOptions,
    ) -> MediaResult<PathBuf> {
        let output = output.with_extension("webm");
        let options = self.webm_options(input, &output).merge(extra);
        self.transcoder.run_transcode(&options).await?;
        Ok(output)
    }

    /// Converts `input` to H.264 MP4. Entries in `extra` override the
    /// defaults; the output extension is forced.
    pub async fn convert_to_h264(
        &self,
        input: &Path,
        output: &Path,
        extra: CommandOptions,
    ) -> MediaResult<PathBuf> {
        let output = output.with_extension("mp4");
        let options = self.h264_options(input, &output).merge(extra);
        self.transcoder.run_transcode(&options).await?;
        Ok(output)
    }

    fn webm_options(&self, input: &Path, output: &Path) -> CommandOptions {
        CommandOptions::new()
            .set("i", input.display().to_string())
            .set("vcodec", self.config.web_video_codec.clone())
            .set("b:v", format!("{}k", self.config.web_video_bitrate_kbits))
            .set("o", output.display().to_string())
    }

    fn h264_options(&self, input: &Path, output: &Path) -> CommandOptions {
        CommandOptions::new()
            .set("i", input.display().to_string())
            .set("vcodec", H264_CODEC)
            .set("b:v", format!("{H264_BITRATE_KBITS}k"))
            .set("o", output.display().to_string())
    }

    fn composite_options(&self, stills: Vec<String>, out: &Path) -> CommandOptions {
        CommandOptions::new()
            .set("i", stills)
            .set(
                "filter_complex",
                composite_filter_graph(self.config.thumbnail_width, self.config.thumbnail_height),
            )
            .set("o", out.display().to_string())
    }
}

/// Frames sampled for the strip: first, middle, and two before the end.
/// Saturating keeps very short clips valid; repeated indices are fine.
fn sample_frame_indices(frame_count: u64) -> [u64; 3] {
    [0, frame_count / 2, frame_count.saturating_sub(2)]
}

fn still_options(input: &Path, frame_index: u64, out: &Path) -> CommandOptions {
    CommandOptions::new()
        .set("i", input.display().to_string())
        .set("vf", format!("select='eq(n, {frame_index})'"))
        .set("vframes", 1u32)
        .set("o", out.display().to_string())
}

/// Filter graph for the strip: left still padded to the full box, middle
/// and right faded and overlaid at one-third and two-thirds height.
fn composite_filter_graph(width: u32, height: u32) -> String {
    format!(
        "[0:0] scale=-1:{th}/3, pad={tw}:{th} [l]; \
         [1:0] scale=-1:{th}/3, fade=out:300:30:alpha=1 [m]; \
         [2:0] scale=-1:{th}/3, fade=out:300:30:alpha=1 [r]; \
         [l][m] overlay=0:{th}/3 [x]; \
         [x][r] overlay=0:2*{th}/3",
        tw = width,
        th = height,
    )
}
