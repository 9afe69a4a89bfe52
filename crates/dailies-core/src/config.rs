//! Configuration module
//!
//! Runtime settings for the media engine: the storage root, external tool
//! paths, recognized media extensions, and the fixed rendition targets.
//! Configuration is read-only after initialization; every pipeline
//! component borrows the same instance.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants;
use crate::error::{MediaError, MediaResult};

/// Media engine configuration.
#[derive(Clone, Debug)]
pub struct MediaConfig {
    /// Root of the managed local store; sharded paths live under it.
    pub storage_root: PathBuf,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Accepted image extensions, lowercase, with leading dot.
    pub image_extensions: Vec<String>,
    /// Accepted video extensions, lowercase, with leading dot.
    pub video_extensions: Vec<String>,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub thumbnail_format: String,
    pub web_image_width: u32,
    pub web_image_height: u32,
    pub web_image_format: String,
    pub web_video_format: String,
    pub web_video_codec: String,
    pub web_video_bitrate_kbits: u32,
    /// Upper bound on any single external tool invocation.
    pub process_timeout: Duration,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(constants::DEFAULT_STORAGE_ROOT),
            ffmpeg_path: constants::DEFAULT_FFMPEG_PATH.to_string(),
            ffprobe_path: constants::DEFAULT_FFPROBE_PATH.to_string(),
            image_extensions: constants::IMAGE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            video_extensions: constants::VIDEO_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            thumbnail_width: constants::THUMBNAIL_WIDTH,
            thumbnail_height: constants::THUMBNAIL_HEIGHT,
            thumbnail_format: constants::THUMBNAIL_FORMAT.to_string(),
            web_image_width: constants::WEB_IMAGE_WIDTH,
            web_image_height: constants::WEB_IMAGE_HEIGHT,
            web_image_format: constants::WEB_IMAGE_FORMAT.to_string(),
            web_video_format: constants::WEB_VIDEO_FORMAT.to_string(),
            web_video_codec: constants::WEB_VIDEO_CODEC.to_string(),
            web_video_bitrate_kbits: constants::WEB_VIDEO_BITRATE_KBITS,
            process_timeout: Duration::from_secs(constants::DEFAULT_PROCESS_TIMEOUT_SECS),
        }
    }
}

impl MediaConfig {
    /// Configuration with the fixed defaults and the given storage root.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            ..Default::default()
        }
    }

    pub fn from_env() -> MediaResult<Self> {
        let config = Self {
            storage_root: env::var("DAILIES_STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(constants::DEFAULT_STORAGE_ROOT)),
            ffmpeg_path: env::var("FFMPEG_PATH")
                .unwrap_or_else(|_| constants::DEFAULT_FFMPEG_PATH.to_string()),
            ffprobe_path: env::var("FFPROBE_PATH")
                .unwrap_or_else(|_| constants::DEFAULT_FFPROBE_PATH.to_string()),
            web_video_bitrate_kbits: env_parsed(
                "DAILIES_WEB_VIDEO_BITRATE_KBITS",
                constants::WEB_VIDEO_BITRATE_KBITS,
            ),
            process_timeout: Duration::from_secs(env_parsed(
                "DAILIES_PROCESS_TIMEOUT_SECS",
                constants::DEFAULT_PROCESS_TIMEOUT_SECS,
            )),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MediaResult<()> {
        if !self.storage_root.is_absolute() {
            return Err(MediaError::config(format!(
                "storage root must be an absolute path, got {}",
                self.storage_root.display()
            )));
        }
        if self.thumbnail_width == 0 || self.thumbnail_height == 0 {
            return Err(MediaError::config("thumbnail dimensions must be non-zero"));
        }
        if self.web_image_width == 0 || self.web_image_height == 0 {
            return Err(MediaError::config("web image dimensions must be non-zero"));
        }
        if self.web_video_bitrate_kbits == 0 {
            return Err(MediaError::config("web video bitrate must be non-zero"));
        }
        if self.process_timeout.is_zero() {
            return Err(MediaError::config("process timeout must be non-zero"));
        }
        Ok(())
    }

    /// True when `extension` (with leading dot, any case) is a recognized
    /// image extension.
    pub fn is_image_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.image_extensions.iter().any(|e| *e == extension)
    }

    /// True when `extension` (with leading dot, any case) is a recognized
    /// video extension.
    pub fn is_video_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.video_extensions.iter().any(|e| *e == extension)
    }
}

/// Lowercased extension of `filename` including the leading dot, or an
/// empty string when there is none. A leading-dot name like `.hidden` has
/// no extension.
pub fn file_extension(filename: &str) -> String {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => filename[dot..].to_lowercase(),
        _ => String::new(),
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(var = name, value = %raw, "ignoring unparseable environment override");
                default
            }
        },
        Err(_) => default,
    }
}
