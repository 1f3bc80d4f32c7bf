//! # Filter Registry
//!
//! Maps a transform name to a pure function `(image, params) → image | error`.
//!
//! | Name | Params | Notes |
//! |------|--------|-------|
//! | `dilate` | 1 float | square radius, rounded |
//! | `edgedetection` | 1 float | clamped to [0.0, 1.0]; 0 is a copy, 1 the full edge map |
//! | `erode` | 1 float | square radius, rounded |
//! | `median` | 1 float | radius, rounded |
//! | `emboss`, `grayscale`, `invert`, `sepia`, `sharpen`, `sobel` | none | extra params ignored |
//! | `quality` | - | reserved no-op |
//!
//! Any other name is logged and skipped.

use crate::errors::{ChainError, FilterError};
use image::{imageops, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};
use shared_types::Transform;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// A filter: consumes the previous step's output.
pub type FilterFn = fn(RgbaImage, &[String]) -> Result<RgbaImage, FilterError>;

/// Reserved for future encode-quality control; never applied.
pub const RESERVED_QUALITY: &str = "quality";

#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, FilterFn>,
    reserved: HashSet<String>,
}

impl FilterRegistry {
    /// A registry with no filters.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard filter set.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("dilate", dilate);
        registry.register("edgedetection", edge_detection);
        registry.register("erode", erode);
        registry.register("median", median);
        registry.register("emboss", emboss);
        registry.register("grayscale", grayscale);
        registry.register("invert", invert);
        registry.register("sepia", sepia);
        registry.register("sharpen", sharpen);
        registry.register("sobel", sobel);
        registry.reserve(RESERVED_QUALITY);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, filter: FilterFn) {
        self.filters.insert(name.into(), filter);
    }

    /// Recognise `name` as a deliberate no-op.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.reserved.insert(name.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<FilterFn> {
        self.filters.get(name).copied()
    }

    #[must_use]
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Registered filter names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Apply `chain` in order, each step consuming the previous output.
    pub fn apply_chain(&self, mut image: RgbaImage, chain: &[Transform]) -> Result<RgbaImage, ChainError> {
        for (index, transform) in chain.iter().enumerate() {
            let name = transform.name.as_str();
            match self.get(name) {
                Some(filter) => {
                    image = filter(image, &transform.params).map_err(|source| ChainError {
                        index,
                        name: name.to_string(),
                        source,
                    })?;
                    debug!(index, filter = name, "Transform applied");
                }
                None if self.is_reserved(name) => {}
                None => warn!(index, filter = name, "Unknown transform skipped"),
            }
        }
        Ok(image)
    }
}

// =============================================================================
// PARAMETERS
// =============================================================================

fn single_param(filter: &str, params: &[String]) -> Result<f64, FilterError> {
    let [raw] = params else {
        return Err(FilterError::Arity {
            filter: filter.to_string(),
            expected: 1,
            got: params.len(),
        });
    };

    let invalid = |reason: String| FilterError::InvalidParameter {
        filter: filter.to_string(),
        value: raw.clone(),
        reason,
    };
    let value: f64 = raw.trim().parse().map_err(|e: std::num::ParseFloatError| invalid(e.to_string()))?;
    if !value.is_finite() {
        return Err(invalid("not a finite number".to_string()));
    }
    Ok(value)
}

/// Round a radius to a kernel size in `0..=255`.
fn radius(value: f64) -> u8 {
    value.round().clamp(0.0, f64::from(u8::MAX)) as u8
}

// =============================================================================
// HELPERS
// =============================================================================

/// Run a single-channel operator over R, G and B; alpha is kept.
fn per_channel(image: &RgbaImage, op: impl Fn(&GrayImage) -> GrayImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let channels: [GrayImage; 3] = std::array::from_fn(|channel| {
        op(&GrayImage::from_fn(width, height, |x, y| {
            Luma([image.get_pixel(x, y)[channel]])
        }))
    });

    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            channels[0].get_pixel(x, y)[0],
            channels[1].get_pixel(x, y)[0],
            channels[2].get_pixel(x, y)[0],
            image.get_pixel(x, y)[3],
        ])
    })
}

/// 3x3 convolution on colour channels; alpha is kept.
fn convolve3x3(image: &RgbaImage, kernel: &[f32; 9]) -> RgbaImage {
    let mut out: RgbaImage = imageops::filter3x3(image, kernel);
    for (dst, src) in out.pixels_mut().zip(image.pixels()) {
        dst[3] = src[3];
    }
    out
}

// =============================================================================
// FILTERS
// =============================================================================

fn dilate(image: RgbaImage, params: &[String]) -> Result<RgbaImage, FilterError> {
    let mask = Mask::square(radius(single_param("dilate", params)?));
    Ok(per_channel(&image, |channel| grayscale_dilate(channel, &mask)))
}

fn erode(image: RgbaImage, params: &[String]) -> Result<RgbaImage, FilterError> {
    let mask = Mask::square(radius(single_param("erode", params)?));
    Ok(per_channel(&image, |channel| grayscale_erode(channel, &mask)))
}

fn median(image: RgbaImage, params: &[String]) -> Result<RgbaImage, FilterError> {
    let r = u32::from(radius(single_param("median", params)?));
    if r == 0 {
        return Ok(image);
    }
    Ok(imageproc::filter::median_filter(&image, r, r))
}

fn edge_detection(image: RgbaImage, params: &[String]) -> Result<RgbaImage, FilterError> {
    let strength = single_param("edgedetection", params)?.clamp(0.0, 1.0);
    if strength <= 0.0 {
        return Ok(image);
    }
    // Blend of identity and the 8-neighbour Laplacian; 1.0 is the pure edge map.
    let s = strength as f32;
    let mut kernel = [-s; 9];
    kernel[4] = (1.0 - s) + 8.0 * s;
    Ok(convolve3x3(&image, &kernel))
}

fn emboss(image: RgbaImage, _params: &[String]) -> Result<RgbaImage, FilterError> {
    const KERNEL: [f32; 9] = [-1.0, -1.0, 0.0, -1.0, 1.0, 1.0, 0.0, 1.0, 1.0];
    Ok(convolve3x3(&image, &KERNEL))
}

fn sharpen(image: RgbaImage, _params: &[String]) -> Result<RgbaImage, FilterError> {
    const KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];
    Ok(convolve3x3(&image, &KERNEL))
}

fn grayscale(image: RgbaImage, _params: &[String]) -> Result<RgbaImage, FilterError> {
    let gray = imageops::grayscale_alpha(&image);
    Ok(RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let [l, a] = gray.get_pixel(x, y).0;
        Rgba([l, l, l, a])
    }))
}

fn invert(mut image: RgbaImage, _params: &[String]) -> Result<RgbaImage, FilterError> {
    imageops::invert(&mut image);
    Ok(image)
}

fn sepia(mut image: RgbaImage, _params: &[String]) -> Result<RgbaImage, FilterError> {
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
        let tone = |cr: f32, cg: f32, cb: f32| (cr * r + cg * g + cb * b).round().clamp(0.0, 255.0) as u8;
        *pixel = Rgba([
            tone(0.393, 0.769, 0.189),
            tone(0.349, 0.686, 0.168),
            tone(0.272, 0.534, 0.131),
            a,
        ]);
    }
    Ok(image)
}

fn sobel(image: RgbaImage, _params: &[String]) -> Result<RgbaImage, FilterError> {
    let gray = imageops::grayscale(&image);
    let gradients = imageproc::gradients::sobel_gradients(&gray);
    Ok(RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let magnitude = gradients.get_pixel(x, y)[0].min(255) as u8;
        Rgba([magnitude, magnitude, magnitude, 255])
    }))
}
