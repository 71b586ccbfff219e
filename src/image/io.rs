//! I/O helpers for raster images and JSON.
//!
//! - `load_raster_image`: decode a PNG/JPEG/etc. into an owned [`RasterImage`].
//! - `save_raster_image`: encode a [`RasterImage`] to disk.
//! - `save_luma`: write a [`LumaImage`] as an 8-bit grayscale PNG.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ImageView, LumaImage, PixelFormat, RasterImage};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, Rgba};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk, keeping grayscale and alpha layouts when present.
pub fn load_raster_image(path: &Path) -> Result<RasterImage, String> {
    let img = image::open(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    let (format, width, height, data) = match img {
        DynamicImage::ImageLuma8(buf) => {
            let (w, h) = buf.dimensions();
            (PixelFormat::Gray8, w, h, buf.into_raw())
        }
        DynamicImage::ImageRgba8(buf) => {
            let (w, h) = buf.dimensions();
            (PixelFormat::Rgba8, w, h, buf.into_raw())
        }
        other => {
            let buf = other.into_rgb8();
            let (w, h) = buf.dimensions();
            (PixelFormat::Rgb8, w, h, buf.into_raw())
        }
    };
    RasterImage::new(width as usize, height as usize, format, data)
        .map_err(|e| format!("Decoded buffer for {} is inconsistent: {e}", path.display()))
}

/// Save a raster in the format implied by the file extension.
pub fn save_raster_image(image: &RasterImage, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let (w, h) = (image.width() as u32, image.height() as u32);
    let data = image.data().to_vec();
    let dynamic = match image.format() {
        PixelFormat::Gray8 => ImageBuffer::<Luma<u8>, _>::from_raw(w, h, data)
            .map(DynamicImage::ImageLuma8),
        PixelFormat::Rgb8 => {
            ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, data).map(DynamicImage::ImageRgb8)
        }
        PixelFormat::Rgba8 => {
            ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, data).map(DynamicImage::ImageRgba8)
        }
    }
    .ok_or_else(|| "Failed to create image buffer".to_string())?;
    dynamic
        .save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Save a float image to a grayscale PNG, clamping values in [0, 255].
pub fn save_luma(image: &LumaImage, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(image.w as u32, image.h as u32);
    for y in 0..image.h {
        for (x, &px) in image.row(y).iter().enumerate() {
            let v = (px * 255.0).clamp(0.0, 255.0);
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
