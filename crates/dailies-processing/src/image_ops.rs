//! Image renditions.
//!
//! Thumbnails and web versions of still images are produced in-process with
//! a two-stage downscale: a cheap triangle pass to twice the target box,
//! then a high-quality pass to the exact box. Images already inside the box
//! are re-encoded without resizing; nothing is ever upscaled. GIF input is
//! the exception and is copied through untouched, since resampling would
//! flatten an animation to its first frame.

use std::path::{Path, PathBuf};

use dailies_core::{file_extension, MediaConfig, MediaError, MediaResult};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use crate::render::rendition_path;

const GIF_EXTENSION: &str = ".gif";

/// Thumbnail rendition of `input`, written into `out_dir`.
pub async fn render_thumbnail(
    config: &MediaConfig,
    input: &Path,
    out_dir: &Path,
) -> MediaResult<PathBuf> {
    render_to_box(
        input,
        out_dir,
        config.thumbnail_width,
        config.thumbnail_height,
        &config.thumbnail_format,
    )
    .await
}

/// Web rendition of `input`, written into `out_dir`. Larger box than the
/// thumbnail, same fitting rules.
pub async fn render_web_version(
    config: &MediaConfig,
    input: &Path,
    out_dir: &Path,
) -> MediaResult<PathBuf> {
    render_to_box(
        input,
        out_dir,
        config.web_image_width,
        config.web_image_height,
        &config.web_image_format,
    )
    .await
}

async fn render_to_box(
    input: &Path,
    out_dir: &Path,
    width: u32,
    height: u32,
    format: &str,
) -> MediaResult<PathBuf> {
    let start = std::time::Instant::now();
    let filename = input
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| MediaError::invalid_path(input, "missing file name"))?;
    tokio::fs::create_dir_all(out_dir).await?;

    if file_extension(filename) == GIF_EXTENSION {
        let out = rendition_path(input, out_dir, GIF_EXTENSION)?;
        tokio::fs::copy(input, &out).await?;
        tracing::debug!(path = %out.display(), "copied animated image through");
        return Ok(out);
    }

    let image = open_image(input)?;
    let (source_width, source_height) = (image.width(), image.height());
    let fitted = downscale_to_box(image, width, height);

    let out = rendition_path(input, out_dir, format)?;
    fitted
        .save(&out)
        .map_err(|err| MediaError::ImageProcessing(err.to_string()))?;

    tracing::debug!(
        path = %out.display(),
        source = %format!("{source_width}x{source_height}"),
        rendered = %format!("{}x{}", fitted.width(), fitted.height()),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "rendered image"
    );
    Ok(out)
}

fn open_image(path: &Path) -> MediaResult<DynamicImage> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|err| MediaError::ImageProcessing(err.to_string()))
}

/// Fits an image into `width` x `height` preserving aspect ratio. Two
/// passes when the source is well over the box, one when it is close, none
/// when it already fits.
fn downscale_to_box(image: DynamicImage, width: u32, height: u32) -> DynamicImage {
    let image = if exceeds(&image, 2 * width, 2 * height) {
        image.resize(2 * width, 2 * height, FilterType::Triangle)
    } else {
        image
    };
    if exceeds(&image, width, height) {
        image.resize(width, height, FilterType::Lanczos3)
    } else {
        image
    }
}

fn exceeds(image: &DynamicImage, width: u32, height: u32) -> bool {
    image.width() > width || image.height() > height
}
