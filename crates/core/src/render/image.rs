//! Image decode, scaling, and encoding built on the `image` crate.
//!
//! The `image` crate's own WebP encoder is lossless-only, so lossy WebP
//! goes through libwebp bindings instead.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

use super::error::RenderError;
use crate::derivative::OutputFormat;

/// Decodes an image file from disk.
///
/// # Errors
///
/// Returns [`RenderError::Decode`] when the file is missing or not a
/// readable image.
pub fn load(path: &Path) -> Result<DynamicImage, RenderError> {
    image::open(path).map_err(|err| RenderError::decode(format!("{}: {err}", path.display())))
}

/// Scales to exactly `(width, height)`, stretching when the aspect ratio
/// differs.
#[must_use]
pub fn resize_exact(source: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    source.resize_exact(width, height, FilterType::Lanczos3)
}

/// Scales preserving aspect ratio so the result covers `(width, height)`,
/// then center-crops to exactly that size.
#[must_use]
pub fn resize_to_fill(source: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    source.resize_to_fill(width, height, FilterType::Lanczos3)
}

/// Fits `source` inside `(width, height)` preserving aspect ratio and
/// pastes it centered on an opaque white canvas of exactly that size.
#[must_use]
pub fn fit_on_white_canvas(source: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let fitted = source.resize(width, height, FilterType::Lanczos3);
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let x = i64::from((width - fitted.width()) / 2);
    let y = i64::from((height - fitted.height()) / 2);
    image::imageops::overlay(&mut canvas, &fitted.to_rgb8(), x, y);
    DynamicImage::ImageRgb8(canvas)
}

/// Encodes at the requested quality. Quality is ignored for PNG, which is
/// always written at maximum compression.
///
/// # Errors
///
/// Returns [`RenderError::Encode`] when the encoder rejects the image.
pub fn encode(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, RenderError> {
    match format {
        OutputFormat::Webp => encode_webp(image, quality),
        OutputFormat::Jpeg => encode_jpeg(image, quality),
        OutputFormat::Png => encode_png(image),
    }
}

fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, RenderError> {
    let rgba = image.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    Ok(encoder.encode(f32::from(quality)).to_vec())
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    // JPEG has no alpha channel.
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    image
        .to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|err| RenderError::encode(err.to_string()))?;
    Ok(bytes)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, PngFilter::Adaptive);
    image
        .write_with_encoder(encoder)
        .map_err(|err| RenderError::encode(err.to_string()))?;
    Ok(bytes)
}
