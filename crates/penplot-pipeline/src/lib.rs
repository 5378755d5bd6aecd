//! penplot-pipeline: Pure toolpath generation (sans-IO).
//!
//! Converts a raster image into a single continuous pen-plotter path:
//! decode -> place on the machine -> resample to one pixel per mm ->
//! brightness-modulated sine-wave scan.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Files, serial ports and
//! drawing surfaces live in `penplot-io`.

pub mod brightness;
pub mod decode;
pub mod diagnostics;
pub mod placement;
pub mod sine;
pub mod types;

pub use brightness::BrightnessMap;
pub use diagnostics::{Clock, PipelineDiagnostics, process_with_diagnostics};
pub use types::{
    Dimensions, MachineBounds, Path, PathConfig, PipelineError, Point, ProcessResult, Region,
    RgbaImage,
};

/// Run the full pipeline on encoded image bytes.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP), the machine bounds and
/// a configuration, then produces a [`ProcessResult`] holding the
/// toolpath, the region the image was placed in, and the source
/// dimensions.
///
/// # Pipeline steps
///
/// 1. Decode image to RGBA
/// 2. Fit the image inside the machine (aspect preserved, centred)
/// 3. Resample to one pixel per millimetre of the region
/// 4. Generate the brightness-modulated sine-wave scan
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` or `bounds` is invalid.
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
pub fn process(
    image_bytes: &[u8],
    bounds: &MachineBounds,
    config: &PathConfig,
) -> Result<ProcessResult, PipelineError> {
    config.validate()?;
    let image = decode::decode(image_bytes)?;
    process_image(&image, bounds, config)
}

/// Run steps 2-4 of [`process`] on an already decoded image.
///
/// Used when the machine size changes and the loaded image must be
/// re-placed without decoding it again.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` or `bounds` is invalid.
pub fn process_image(
    image: &RgbaImage,
    bounds: &MachineBounds,
    config: &PathConfig,
) -> Result<ProcessResult, PipelineError> {
    config.validate()?;
    bounds.validate()?;

    let dimensions = Dimensions {
        width: image.width(),
        height: image.height(),
    };
    let region = placement::fit_region(dimensions, bounds, config.fill);
    let sampled = decode::resample(image, &region);
    let path = sine::generate_sine_path(&BrightnessMap::new(&sampled), &region, config);
    tracing::debug!(
        points = path.len(),
        width = region.width,
        height = region.height,
        "generated sine path",
    );

    Ok(ProcessResult {
        path,
        region,
        dimensions,
    })
}
