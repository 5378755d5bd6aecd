//! Placement of a source image on the machine.
//!
//! The image keeps its aspect ratio and is scaled to a fraction of the
//! machine (see [`PathConfig::fill`](crate::PathConfig::fill)) along
//! whichever axis constrains it, then centred.

use crate::types::{Dimensions, MachineBounds, Point, Region};

/// Fit an image of `image` pixel dimensions inside `bounds`.
///
/// The image is first sized to `fill × bounds.width`; if that makes it
/// taller than `fill × bounds.height`, it is sized by height instead.
/// The resulting size is floored to whole millimetres and the region is
/// centred on the machine.
///
/// Degenerate images (zero width or height) produce an empty region at
/// the machine centre.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fit_region(image: Dimensions, bounds: &MachineBounds, fill: f64) -> Region {
    let centre = Point::new(bounds.width / 2.0, bounds.height / 2.0);
    if image.width == 0 || image.height == 0 {
        return Region::new(centre, 0, 0);
    }

    let aspect = f64::from(image.width) / f64::from(image.height);
    let mut draw_w = bounds.width * fill;
    let mut draw_h = draw_w / aspect;
    if draw_h > bounds.height * fill {
        draw_h = bounds.height * fill;
        draw_w = draw_h * aspect;
    }

    // Saturating float-to-int casts: negative or NaN sizes become 0.
    let width = draw_w.floor().max(0.0) as u32;
    let height = draw_h.floor().max(0.0) as u32;

    let origin = Point::new(
        (bounds.width - f64::from(width)) / 2.0,
        (bounds.height - f64::from(height)) / 2.0,
    );
    Region::new(origin, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn wide_image_is_width_constrained() {
        let bounds = MachineBounds::new(600.0, 400.0);
        let region = fit_region(dims(200, 100), &bounds, 0.8);
        assert_eq!((region.width, region.height), (480, 240));
        assert_eq!(region.origin, Point::new(60.0, 80.0));
    }

    #[test]
    fn tall_image_is_height_constrained() {
        let bounds = MachineBounds::new(600.0, 400.0);
        let region = fit_region(dims(100, 200), &bounds, 0.8);
        assert_eq!((region.width, region.height), (160, 320));
        assert_eq!(region.origin, Point::new(220.0, 40.0));
    }

    #[test]
    fn region_stays_inside_bounds() {
        let bounds = MachineBounds::new(333.0, 217.0);
        for (w, h) in [(1, 1), (1000, 3), (3, 1000), (640, 480), (97, 89)] {
            let region = fit_region(dims(w, h), &bounds, 0.8);
            assert!(region.origin.x >= 0.0 && region.origin.y >= 0.0);
            assert!(region.origin.x + f64::from(region.width) <= bounds.width);
            assert!(region.origin.y + f64::from(region.height) <= bounds.height);
        }
    }

    #[test]
    fn sizes_are_floored_to_whole_millimetres() {
        let bounds = MachineBounds::new(101.0, 101.0);
        let region = fit_region(dims(3, 1), &bounds, 0.8);
        // 101 * 0.8 = 80.8 wide, 26.93 tall.
        assert_eq!((region.width, region.height), (80, 26));
    }

    #[test]
    fn degenerate_image_gives_empty_region() {
        let bounds = MachineBounds::default();
        let region = fit_region(dims(0, 10), &bounds, 0.8);
        assert!(region.is_empty());
        assert_eq!(region.origin, Point::new(300.0, 200.0));
    }
}
