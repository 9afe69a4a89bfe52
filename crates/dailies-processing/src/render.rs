//! Render policy.
//!
//! One dispatch point decides how a stored file becomes a thumbnail or a
//! web rendition: still images are processed in-process, clips go through
//! the external transcoder, and anything else is rejected by extension
//! before any external process is spawned.

use std::path::{Path, PathBuf};

use dailies_core::{file_extension, MediaConfig, MediaError, MediaResult};
use serde::{Deserialize, Serialize};

use crate::image_ops;
use crate::video_ops::VideoRenderer;

/// Media class of a filename, decided by extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies `filename` against the configured extension sets.
    pub fn detect(config: &MediaConfig, filename: &str) -> MediaResult<MediaKind> {
        let extension = file_extension(filename);
        if config.is_image_extension(&extension) {
            Ok(MediaKind::Image)
        } else if config.is_video_extension(&extension) {
            Ok(MediaKind::Video)
        } else if extension.is_empty() {
            Err(MediaError::unsupported_media(filename))
        } else {
            Err(MediaError::unsupported_media(extension))
        }
    }
}

/// Renders thumbnails and web versions for any supported media file.
#[derive(Debug, Clone)]
pub struct MediaRenderer {
    config: MediaConfig,
    video: VideoRenderer,
}

impl MediaRenderer {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            video: VideoRenderer::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Thumbnail rendition of `input`, written into `out_dir`.
    pub async fn render_thumbnail(&self, input: &Path, out_dir: &Path) -> MediaResult<PathBuf> {
        match self.kind_of(input)? {
            MediaKind::Image => image_ops::render_thumbnail(&self.config, input, out_dir).await,
            MediaKind::Video => self.video.render_thumbnail(input, out_dir).await,
        }
    }

    /// Web rendition of `input`, written into `out_dir`.
    pub async fn render_web_version(&self, input: &Path, out_dir: &Path) -> MediaResult<PathBuf> {
        match self.kind_of(input)? {
            MediaKind::Image => image_ops::render_web_version(&self.config, input, out_dir).await,
            MediaKind::Video => self.video.render_web_version(input, out_dir).await,
        }
    }

    fn kind_of(&self, input: &Path) -> MediaResult<MediaKind> {
        let filename = input
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| MediaError::invalid_path(input, "missing file name"))?;
        MediaKind::detect(&self.config, filename)
    }
}

/// Output path for a rendition of `input`: same stem, the rendition's
/// extension, inside `out_dir`.
pub(crate) fn rendition_path(input: &Path, out_dir: &Path, format: &str) -> MediaResult<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| MediaError::invalid_path(input, "missing file name"))?;
    Ok(out_dir.join(format!("{stem}{format}")))
}
