//! Drawing surface seam and drawing intents.
//!
//! Playback and session logic never draw directly. They return
//! [`DrawIntent`]s; [`render`] turns intents into calls on a [`Surface`]
//! implementation (a raster canvas in `penplot-io`, or
//! [`RecordingSurface`] in tests).
//!
//! All coordinates are machine millimetres.

use penplot_pipeline::{MachineBounds, Path, Point, Region, RgbaImage};

/// Grid pitch in millimetres.
pub const GRID_SPACING_MM: f64 = 50.0;

/// Opacity of the source image drawn behind the path.
pub const PREVIEW_OPACITY: f32 = 0.2;

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Opaque colour from RGB.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
}

/// Stroke colour and width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// Line colour.
    pub color: Color,
    /// Line width in millimetres.
    pub width: f32,
}

impl StrokeStyle {
    /// Light grey background grid.
    pub const GRID: Self = Self {
        color: Color::rgb(0xee, 0xee, 0xee),
        width: 1.0,
    };

    /// Black ink for the full static path.
    pub const INK: Self = Self {
        color: Color::rgb(0, 0, 0),
        width: 1.5,
    };

    /// Magenta plotter head for animated segments.
    pub const HEAD: Self = Self {
        color: Color::rgb(0xff, 0x00, 0xff),
        width: 3.0,
    };
}

/// Primitive drawing operations in machine coordinates.
pub trait Surface {
    /// Erase everything.
    fn clear(&mut self);

    /// Draw horizontal and vertical grid lines every `spacing` mm
    /// across `bounds`, including both edges.
    fn draw_grid(&mut self, bounds: &MachineBounds, spacing: f64, style: &StrokeStyle);

    /// Draw `image` stretched over `region` at `opacity` (0..=1).
    fn draw_image(&mut self, image: &RgbaImage, region: &Region, opacity: f32);

    /// Stroke a connected polyline. Fewer than two points draws nothing.
    fn draw_polyline(&mut self, points: &[Point], style: &StrokeStyle);
}

/// Something the display should do in response to a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawIntent {
    /// Clear and draw the base scene: grid, faint preview, full path.
    Redraw,
    /// Draw the head over path points `from..=to`.
    Segment {
        /// First path index of the span.
        from: usize,
        /// Last path index of the span (inclusive).
        to: usize,
    },
}

/// Everything [`render`] needs to draw the base scene.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    /// Machine area.
    pub bounds: &'a MachineBounds,
    /// Current toolpath (possibly empty).
    pub path: &'a Path,
    /// Loaded image and where it sits, for the faint preview.
    pub preview: Option<(&'a RgbaImage, &'a Region)>,
}

/// Apply `intents` to `surface` in order.
///
/// Segments outside the path are clamped; an empty path draws no segments.
pub fn render<S: Surface + ?Sized>(surface: &mut S, scene: &Scene<'_>, intents: &[DrawIntent]) {
    for intent in intents {
        match *intent {
            DrawIntent::Redraw => draw_base(surface, scene),
            DrawIntent::Segment { from, to } => {
                let points = scene.path.points();
                let Some(last) = scene.path.last_index() else {
                    continue;
                };
                let to = to.min(last);
                if from < to {
                    surface.draw_polyline(&points[from..=to], &StrokeStyle::HEAD);
                }
            }
        }
    }
}

/// Clear, then draw the grid, faint image preview and the full path.
pub fn draw_base<S: Surface + ?Sized>(surface: &mut S, scene: &Scene<'_>) {
    surface.clear();
    surface.draw_grid(scene.bounds, GRID_SPACING_MM, &StrokeStyle::GRID);
    if let Some((image, region)) = scene.preview {
        surface.draw_image(image, region, PREVIEW_OPACITY);
    }
    if scene.path.len() > 1 {
        surface.draw_polyline(scene.path.points(), &StrokeStyle::INK);
    }
}

/// A call recorded by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    /// [`Surface::clear`].
    Clear,
    /// [`Surface::draw_grid`] with its spacing.
    Grid {
        /// Grid pitch.
        spacing: f64,
    },
    /// [`Surface::draw_image`].
    Image {
        /// Target region.
        region: Region,
        /// Opacity used.
        opacity: f32,
    },
    /// [`Surface::draw_polyline`].
    Polyline {
        /// Points stroked.
        points: Vec<Point>,
        /// Style used.
        style: StrokeStyle,
    },
}

/// Surface that records every call, for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    /// Calls in order.
    pub calls: Vec<SurfaceCall>,
}

impl RecordingSurface {
    /// Polylines drawn with `style`, in order.
    #[must_use]
    pub fn polylines_with(&self, style: &StrokeStyle) -> Vec<&[Point]> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::Polyline { points, style: s } if s == style => Some(points.as_slice()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.calls.push(SurfaceCall::Clear);
    }

    fn draw_grid(&mut self, _bounds: &MachineBounds, spacing: f64, _style: &StrokeStyle) {
        self.calls.push(SurfaceCall::Grid { spacing });
    }

    fn draw_image(&mut self, _image: &RgbaImage, region: &Region, opacity: f32) {
        self.calls.push(SurfaceCall::Image {
            region: *region,
            opacity,
        });
    }

    fn draw_polyline(&mut self, points: &[Point], style: &StrokeStyle) {
        self.calls.push(SurfaceCall::Polyline {
            points: points.to_vec(),
            style: *style,
        });
    }
}
