//! Image decoding and resampling onto the machine grid.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces an RGBA
//! image, then resamples it so one pixel covers one millimetre of the
//! placed [`Region`]. This is the first step in the pipeline: raw bytes
//! in, sample-ready `RgbaImage` out.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::types::{PipelineError, Region};

/// Decode raw image bytes into an RGBA image.
///
/// Supports whatever formats the `image` crate was built with (PNG,
/// JPEG, BMP, WebP in this workspace).
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
#[must_use = "returns the decoded image"]
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}

/// Resample `image` to the pixel grid of `region` (one pixel per mm).
///
/// Uses a triangle (bilinear) filter. An empty region yields an empty
/// image rather than an error.
#[must_use]
pub fn resample(image: &RgbaImage, region: &Region) -> RgbaImage {
    if region.is_empty() || image.width() == 0 || image.height() == 0 {
        return RgbaImage::new(region.width, region.height);
    }
    if image.dimensions() == (region.width, region.height) {
        return image.clone();
    }
    imageops::resize(image, region.width, region.height, FilterType::Triangle)
}
