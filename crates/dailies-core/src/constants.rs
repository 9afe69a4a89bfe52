//! Fixed layout and format defaults shared across the engine.
//!
//! These values are the on-disk contract other subsystems parse; they are
//! deliberately constants rather than per-call parameters.

/// Prefix of every repository-relative link string
/// (ex: `media/b0/e6/b0e64b16c6bd4857a91be47fb2517b53.jpg`).
pub const STORAGE_MARKER: &str = "media";

/// Product segment in owner-relative layout paths
/// (ex: `References/Dailies/` under a task's folder).
pub const VENDOR_MARKER: &str = "Dailies";

pub const REFERENCES_FOLDER: &str = "References";
pub const OUTPUTS_FOLDER: &str = "Outputs";
pub const FOR_WEB_FOLDER: &str = "ForWeb";
pub const THUMBNAIL_FOLDER: &str = "Thumbnail";

/// Maximum artifact chain length: original -> web version -> thumbnail.
pub const MAX_CHAIN_DEPTH: usize = 3;

/// Accepted image extensions, lowercase, with leading dot.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".gif", ".png", ".tga", ".tif", ".tiff", ".exr", ".bmp",
];

/// Accepted video extensions, lowercase, with leading dot.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mov", ".avi", ".flv", ".mp4", ".mpg", ".mpeg", ".webm",
];

pub const THUMBNAIL_WIDTH: u32 = 512;
pub const THUMBNAIL_HEIGHT: u32 = 512;
pub const THUMBNAIL_FORMAT: &str = ".png";

pub const WEB_IMAGE_WIDTH: u32 = 1920;
pub const WEB_IMAGE_HEIGHT: u32 = 1080;
pub const WEB_IMAGE_FORMAT: &str = ".png";

pub const WEB_VIDEO_FORMAT: &str = ".webm";
pub const WEB_VIDEO_CODEC: &str = "libvpx";
pub const WEB_VIDEO_BITRATE_KBITS: u32 = 2048;

pub const H264_FORMAT: &str = ".mp4";
pub const H264_CODEC: &str = "libx264";
pub const H264_BITRATE_KBITS: u32 = 4096;

pub const DEFAULT_STORAGE_ROOT: &str = "/var/lib/dailies/storage";
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";
pub const DEFAULT_FFPROBE_PATH: &str = "ffprobe";
pub const DEFAULT_PROCESS_TIMEOUT_SECS: u64 = 600;
