//! Shared types for the penplot toolpath pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference the
/// decoded source image without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in machine coordinates (millimetres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (millimetres from the left edge of the machine).
    pub x: f64,
    /// Vertical position (millimetres from the top edge of the machine).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// An ordered toolpath: the sequence of points the pen head visits.
///
/// Insertion order is traversal order. A path is never mutated after
/// generation; a new image load or a clear replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path(Vec<Point>);

impl Path {
    /// Create a new path from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the path has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the path.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Index of the final point, or `None` for an empty path.
    #[must_use]
    pub const fn last_index(&self) -> Option<usize> {
        self.0.len().checked_sub(1)
    }

    /// Returns the point at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Point> {
        self.0.get(index)
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Total travel length of the path in millimetres.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.0.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Plottable area of the machine in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineBounds {
    /// Width in millimetres.
    pub width: f64,
    /// Height in millimetres.
    pub height: f64,
}

impl MachineBounds {
    /// Default machine width in millimetres.
    pub const DEFAULT_WIDTH: f64 = 600.0;
    /// Default machine height in millimetres.
    pub const DEFAULT_HEIGHT: f64 = 400.0;

    /// Create machine bounds.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check that both sides are finite and strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] otherwise.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(PipelineError::InvalidConfig(format!(
                "machine bounds must be positive, got {}x{}",
                self.width, self.height,
            )))
        }
    }
}

impl Default for MachineBounds {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }
}

/// The rectangle an image occupies on the machine.
///
/// Sizes are whole millimetres: the image is resampled to one pixel per
/// millimetre, so `width`/`height` double as the pixel dimensions of the
/// brightness map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Top-left corner in machine coordinates.
    pub origin: Point,
    /// Width in millimetres (and sample pixels).
    pub width: u32,
    /// Height in millimetres (and sample pixels).
    pub height: u32,
}

impl Region {
    /// Create a region.
    #[must_use]
    pub const fn new(origin: Point, width: u32, height: u32) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    /// Returns `true` if the region covers no area.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Configuration for sine-wave toolpath generation.
///
/// All distances are millimetres. Use [`PathConfig::validate`] before
/// handing user-supplied values to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathConfig {
    /// Distance between scan passes. The sine amplitude peaks at half
    /// this value, so neighbouring passes never overlap.
    pub line_spacing: u32,

    /// Step between brightness samples along a pass.
    pub resolution: u32,

    /// Spatial frequency of the carrier wave in radians per millimetre
    /// of local x.
    pub frequency: f64,

    /// Fraction of the machine area the placed image may occupy along
    /// its constraining axis.
    pub fill: f64,
}

impl PathConfig {
    /// Default distance between passes.
    pub const DEFAULT_LINE_SPACING: u32 = 10;
    /// Default sample step along a pass.
    pub const DEFAULT_RESOLUTION: u32 = 2;
    /// Default carrier frequency.
    pub const DEFAULT_FREQUENCY: f64 = 0.5;
    /// Default placement fill fraction.
    pub const DEFAULT_FILL: f64 = 0.8;

    /// Peak deviation from the pass baseline, reached on pure black.
    #[must_use]
    pub fn max_amplitude(&self) -> f64 {
        f64::from(self.line_spacing) / 2.0
    }

    /// Reject values the generator cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `line_spacing` or
    /// `resolution` is zero, `frequency` is negative or not finite, or
    /// `fill` is outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.line_spacing == 0 {
            return Err(PipelineError::InvalidConfig(
                "line_spacing must be at least 1".to_string(),
            ));
        }
        if self.resolution == 0 {
            return Err(PipelineError::InvalidConfig(
                "resolution must be at least 1".to_string(),
            ));
        }
        if !self.frequency.is_finite() || self.frequency < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "frequency must be finite and non-negative, got {}",
                self.frequency,
            )));
        }
        if !(self.fill > 0.0 && self.fill <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "fill must be in (0, 1], got {}",
                self.fill,
            )));
        }
        Ok(())
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            line_spacing: Self::DEFAULT_LINE_SPACING,
            resolution: Self::DEFAULT_RESOLUTION,
            frequency: Self::DEFAULT_FREQUENCY,
            fill: Self::DEFAULT_FILL,
        }
    }
}

/// Result of running the full pipeline.
///
/// Contains the toolpath plus the placement and source metadata needed
/// by renderers and export serializers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// The single continuous toolpath.
    pub path: Path,

    /// Where the image was placed on the machine.
    pub region: Region,

    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
