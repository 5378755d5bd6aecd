//! Per-pixel brightness lookup.
//!
//! Brightness is the unweighted mean of the red, green and blue channels,
//! normalized to `[0, 1]`. Alpha is ignored. This deliberately differs
//! from perceptual luminance: every channel contributes equally to the
//! darkness the plotter draws.

use image::{Rgba, RgbaImage};

/// Normalized brightness of a single pixel, in `[0, 1]`.
#[must_use]
pub fn pixel_brightness(pixel: Rgba<u8>) -> f64 {
    let [r, g, b, _] = pixel.0;
    let sum = f64::from(r) + f64::from(g) + f64::from(b);
    sum / 3.0 / 255.0
}

/// Random-access brightness view over a resampled image.
///
/// Coordinates are pixel indices, which for a resampled region are also
/// local millimetres.
#[derive(Debug, Clone, Copy)]
pub struct BrightnessMap<'a> {
    image: &'a RgbaImage,
}

impl<'a> BrightnessMap<'a> {
    /// Wrap an image for brightness lookups.
    #[must_use]
    pub const fn new(image: &'a RgbaImage) -> Self {
        Self { image }
    }

    /// Width of the underlying image in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height of the underlying image in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Brightness at pixel `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn brightness(&self, x: u32, y: u32) -> Option<f64> {
        self.image
            .get_pixel_checked(x, y)
            .map(|p| pixel_brightness(*p))
    }
}
