//! Raster drawing surface backed by a `tiny-skia` pixmap.
//!
//! [`RasterSurface`] implements [`Surface`] in machine millimetres: every
//! drawing call is mapped through a uniform `scale` (pixels per mm), so a
//! 600 x 400 mm machine at scale 2 becomes a 1200 x 800 image. The
//! finished canvas can be read back as an [`RgbaImage`] or encoded as PNG.

use std::path::Path as FsPath;

use image::{ImageEncoder, Rgba, RgbaImage};
use penplot_pipeline::{MachineBounds, Point, Region};
use penplot_playback::surface::{Color, StrokeStyle, Surface};
use tiny_skia::{
    FilterQuality, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

/// Default pixels per millimetre.
pub const DEFAULT_SCALE: f32 = 1.0;

/// Errors that can occur creating or exporting a raster surface.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// Scale was zero, negative or not finite.
    #[error("invalid scale {0}, must be a positive number of pixels per mm")]
    InvalidScale(f32),

    /// The pixmap could not be allocated (zero or oversized dimensions).
    #[error("cannot allocate a {width}x{height} pixel canvas")]
    Allocation {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(String),

    /// Writing the output file failed.
    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for RasterError {
    fn from(err: image::ImageError) -> Self {
        Self::PngEncode(err.to_string())
    }
}

/// Anti-aliased canvas covering the whole machine area.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixmap: Pixmap,
    scale: f32,
    background: Color,
}

impl RasterSurface {
    /// Create a white canvas for `bounds` at `scale` pixels per mm.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::InvalidScale`] for a non-positive scale and
    /// [`RasterError::Allocation`] if the pixmap cannot be created.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(bounds: &MachineBounds, scale: f32) -> Result<Self, RasterError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(RasterError::InvalidScale(scale));
        }
        let width = (bounds.width * f64::from(scale)).ceil().max(0.0) as u32;
        let height = (bounds.height * f64::from(scale)).ceil().max(0.0) as u32;
        let pixmap = Pixmap::new(width, height).ok_or(RasterError::Allocation { width, height })?;

        let mut surface = Self {
            pixmap,
            scale,
            background: Color::WHITE,
        };
        surface.clear();
        Ok(surface)
    }

    /// Canvas width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Pixels per millimetre.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    fn transform(&self) -> Transform {
        Transform::from_scale(self.scale, self.scale)
    }

    /// Copy the canvas out as straight (non-premultiplied) RGBA.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_rgba_image(&self) -> RgbaImage {
        let data = self.pixmap.data();
        let mut img = RgbaImage::new(self.width(), self.height());
        for (i, pixel) in img.pixels_mut().enumerate() {
            let off = i * 4;
            let a = data[off + 3];
            if a == 0 {
                *pixel = Rgba([0, 0, 0, 0]);
            } else {
                // Un-premultiply: channel = premultiplied * 255 / alpha.
                let r = u16::from(data[off]) * 255 / u16::from(a);
                let g = u16::from(data[off + 1]) * 255 / u16::from(a);
                let b = u16::from(data[off + 2]) * 255 / u16::from(a);
                *pixel = Rgba([r as u8, g as u8, b as u8, a]);
            }
        }
        img
    }

    /// Encode the canvas as PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::PngEncode`] if encoding fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        let img = self.to_rgba_image();
        let mut png_bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder.write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(png_bytes)
    }

    /// Encode the canvas as PNG and write it to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::PngEncode`] or [`RasterError::Io`].
    pub fn save_png(&self, path: &FsPath) -> Result<(), RasterError> {
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes)?;
        tracing::debug!(path = %path.display(), "wrote canvas");
        Ok(())
    }
}

/// Build a straight-line path through `points`; `None` if degenerate.
#[allow(clippy::cast_possible_truncation)]
fn polyline_path(points: &[Point]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.finish()
}

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Copy an image into a pixmap, treating every pixel as opaque.
fn image_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut data = image.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        px[3] = 255;
    }
    Pixmap::from_vec(data, size)
}

impl Surface for RasterSurface {
    fn clear(&mut self) {
        let Color { r, g, b, a } = self.background;
        self.pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw_grid(&mut self, bounds: &MachineBounds, spacing: f64, style: &StrokeStyle) {
        if spacing.is_nan() || spacing <= 0.0 {
            return;
        }
        let mut pb = PathBuilder::new();
        let (w, h) = (bounds.width as f32, bounds.height as f32);
        let columns = (bounds.width / spacing).floor() as u32;
        for i in 0..=columns {
            let x = (f64::from(i) * spacing) as f32;
            pb.move_to(x, 0.0);
            pb.line_to(x, h);
        }
        let rows = (bounds.height / spacing).floor() as u32;
        for j in 0..=rows {
            let y = (f64::from(j) * spacing) as f32;
            pb.move_to(0.0, y);
            pb.line_to(w, y);
        }
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width: style.width,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &paint_for(style.color),
            &stroke,
            self.transform(),
            None,
        );
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn draw_image(&mut self, image: &RgbaImage, region: &Region, opacity: f32) {
        if region.is_empty() {
            return;
        }
        let Some(src) = image_pixmap(image) else {
            return;
        };
        let sx = region.width as f32 / src.width() as f32;
        let sy = region.height as f32 / src.height() as f32;
        let transform = Transform::from_row(
            sx,
            0.0,
            0.0,
            sy,
            region.origin.x as f32,
            region.origin.y as f32,
        )
        .post_scale(self.scale, self.scale);
        let paint = PixmapPaint {
            opacity: opacity.clamp(0.0, 1.0),
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
    }

    fn draw_polyline(&mut self, points: &[Point], style: &StrokeStyle) {
        let Some(path) = polyline_path(points) else {
            return;
        };
        let stroke = Stroke {
            width: style.width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &paint_for(style.color),
            &stroke,
            self.transform(),
            None,
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn small_bounds() -> MachineBounds {
        MachineBounds::new(100.0, 50.0)
    }

    #[test]
    fn canvas_size_follows_scale() {
        let surface = RasterSurface::new(&small_bounds(), 2.0).unwrap();
        assert_eq!((surface.width(), surface.height()), (200, 100));
    }

    #[test]
    fn rejects_bad_scale() {
        assert!(matches!(
            RasterSurface::new(&small_bounds(), 0.0),
            Err(RasterError::InvalidScale(_))
        ));
        assert!(matches!(
            RasterSurface::new(&small_bounds(), f32::NAN),
            Err(RasterError::InvalidScale(_))
        ));
    }

    #[test]
    fn starts_white() {
        let surface = RasterSurface::new(&small_bounds(), 1.0).unwrap();
        let img = surface.to_rgba_image();
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn polyline_darkens_pixels_along_it() {
        let mut surface = RasterSurface::new(&small_bounds(), 1.0).unwrap();
        surface.draw_polyline(
            &[Point::new(10.0, 25.0), Point::new(90.0, 25.0)],
            &StrokeStyle::INK,
        );
        let img = surface.to_rgba_image();
        assert!(img.get_pixel(50, 25).0[0] < 128);
        assert_eq!(img.get_pixel(50, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn single_point_draws_nothing() {
        let mut surface = RasterSurface::new(&small_bounds(), 1.0).unwrap();
        surface.draw_polyline(&[Point::new(10.0, 25.0)], &StrokeStyle::INK);
        let img = surface.to_rgba_image();
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn faint_preview_blends_over_white() {
        let mut surface = RasterSurface::new(&small_bounds(), 1.0).unwrap();
        let black = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let region = Region::new(Point::new(20.0, 10.0), 40, 20);
        surface.draw_image(&black, &region, 0.2);
        let img = surface.to_rgba_image();

        let inside = img.get_pixel(40, 20).0[0];
        assert!((200..=208).contains(&inside), "got {inside}");
        assert_eq!(img.get_pixel(5, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn grid_lines_every_spacing_including_edges() {
        let bounds = MachineBounds::new(100.0, 100.0);
        let mut surface = RasterSurface::new(&bounds, 1.0).unwrap();
        let style = StrokeStyle {
            color: Color::rgb(0, 0, 0),
            width: 2.0,
        };
        surface.draw_grid(&bounds, 50.0, &style);
        let img = surface.to_rgba_image();
        let dark = |x: u32, y: u32| img.get_pixel(x, y).0[0] < 64;

        // Vertical lines at x = 0, 50 and 100 (the last straddles the edge).
        for x in [0, 49, 50, 99] {
            assert!(dark(x, 25), "column {x} should be on a grid line");
        }
        // Horizontal lines at y = 0, 50 and 100.
        for y in [0, 49, 50, 99] {
            assert!(dark(25, y), "row {y} should be on a grid line");
        }
        for (x, y) in [(25, 25), (75, 25), (25, 75), (75, 75)] {
            assert_eq!(img.get_pixel(x, y).0, [255, 255, 255, 255]);
        }
    }

    #[test]
    fn grid_with_bad_spacing_draws_nothing() {
        let bounds = small_bounds();
        let mut surface = RasterSurface::new(&bounds, 1.0).unwrap();
        surface.draw_grid(&bounds, 0.0, &StrokeStyle::GRID);
        surface.draw_grid(&bounds, f64::NAN, &StrokeStyle::GRID);
        let img = surface.to_rgba_image();
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn clear_restores_background() {
        let mut surface = RasterSurface::new(&small_bounds(), 1.0).unwrap();
        surface.draw_polyline(
            &[Point::new(0.0, 0.0), Point::new(100.0, 50.0)],
            &StrokeStyle::HEAD,
        );
        surface.clear();
        let img = surface.to_rgba_image();
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn png_round_trips_dimensions() {
        let surface = RasterSurface::new(&small_bounds(), 1.5).unwrap();
        let png = surface.encode_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (150, 75));
    }

    #[test]
    fn save_png_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.png");
        let surface = RasterSurface::new(&small_bounds(), 1.0).unwrap();
        surface.save_png(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
