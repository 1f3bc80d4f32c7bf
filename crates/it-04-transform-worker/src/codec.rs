//! Bounded decode and content-type driven encode.
//!
//! The header is probed before any pixel is decoded, so an oversized image
//! is rejected without allocating its frame buffer.

use crate::errors::WorkerError;
use crate::{MAX_IMAGE_HEIGHT, MAX_IMAGE_WIDTH};
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use shared_types::ContentType;
use std::io::Cursor;

/// Maximum accepted image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionLimits {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for DimensionLimits {
    fn default() -> Self {
        Self {
            max_width: MAX_IMAGE_WIDTH,
            max_height: MAX_IMAGE_HEIGHT,
        }
    }
}

impl DimensionLimits {
    #[must_use]
    pub fn admits(&self, width: u32, height: u32) -> bool {
        width <= self.max_width && height <= self.max_height
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, WorkerError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| WorkerError::Probe(e.to_string()))
}

/// Probe the header, enforce `limits`, then decode to RGBA.
pub fn decode_bounded(bytes: &[u8], limits: DimensionLimits) -> Result<RgbaImage, WorkerError> {
    let (width, height) = reader(bytes)?
        .into_dimensions()
        .map_err(|e| WorkerError::Probe(e.to_string()))?;

    if !limits.admits(width, height) {
        return Err(WorkerError::DimensionsExceeded {
            width,
            height,
            max_width: limits.max_width,
            max_height: limits.max_height,
        });
    }

    let image = reader(bytes)?
        .decode()
        .map_err(|e| WorkerError::Decode(e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Encode with the codec for `content_type`.
///
/// JPEG has no alpha channel, so the frame is flattened to RGB first.
pub fn encode(image: RgbaImage, content_type: ContentType) -> Result<Vec<u8>, WorkerError> {
    let (frame, format) = match content_type {
        ContentType::Jpg | ContentType::Jpeg => (
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8()),
            ImageFormat::Jpeg,
        ),
        ContentType::Png => (DynamicImage::ImageRgba8(image), ImageFormat::Png),
        ContentType::Gif => (DynamicImage::ImageRgba8(image), ImageFormat::Gif),
    };

    let mut out = Cursor::new(Vec::new());
    frame
        .write_to(&mut out, format)
        .map_err(|e| WorkerError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}
