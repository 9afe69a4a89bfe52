//! Media fixtures built with the image crate.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

/// PNG bytes of a solid `width` x `height` image.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// GIF bytes of a solid `width` x `height` image.
pub fn gif_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Gif)
}

/// Bytes that carry an image extension but decode as nothing.
pub fn corrupt_bytes() -> Vec<u8> {
    b"these are not pixels".to_vec()
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    RgbaImage::from_pixel(width, height, Rgba([180, 60, 20, 255]))
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}
