//! Brightness-modulated sine-wave toolpath generation.
//!
//! The placed region is swept in horizontal passes `line_spacing` apart,
//! alternating direction every pass (boustrophedon) so the pen never
//! makes a long return stroke. Along each pass brightness is sampled
//! every `resolution` millimetres and the pass baseline is displaced by
//!
//! ```text
//! sin(px * frequency) * (1 - brightness) * line_spacing / 2
//! ```
//!
//! where `px` is the local x of the sample. Dark areas become tall,
//! dense waves; white areas become flat lines.
//!
//! # Scan grid
//!
//! Even passes sample `px = 0, res, 2res, ... < width`. Odd passes
//! start at the right edge and sample `px = width, width - res, ... > 0`.
//! Both directions take `ceil(width / res)` samples. The pixel column is
//! clamped to `width - 1` so the right-edge sample of an odd pass reads
//! the last column instead of running past the row.

use crate::brightness::BrightnessMap;
use crate::types::{Path, PathConfig, Point, Region};

/// Number of passes and samples per pass for a region.
///
/// Returns `(0, 0)` for an empty region or a zero step. The generated
/// path always has exactly `passes * samples_per_pass` points.
#[must_use]
pub const fn scan_shape(region: &Region, config: &PathConfig) -> (u32, u32) {
    if region.is_empty() || config.line_spacing == 0 || config.resolution == 0 {
        return (0, 0);
    }
    (
        region.height.div_ceil(config.line_spacing),
        region.width.div_ceil(config.resolution),
    )
}

/// Generate the sine-wave toolpath for `region`.
///
/// `map` must cover `region.width × region.height` pixels (see
/// [`decode::resample`](crate::decode::resample)). Samples that fall
/// outside the map are treated as white, leaving the baseline
/// undisturbed.
///
/// The result depends only on the inputs; equal inputs always produce
/// an equal path.
#[must_use]
pub fn generate_sine_path(map: &BrightnessMap<'_>, region: &Region, config: &PathConfig) -> Path {
    let (passes, per_pass) = scan_shape(region, config);
    if passes == 0 || per_pass == 0 {
        return Path::default();
    }

    let max_amplitude = config.max_amplitude();
    let mut points = Vec::with_capacity(passes as usize * per_pass as usize);

    for pass in 0..passes {
        let py = pass * config.line_spacing;
        let baseline = region.origin.y + f64::from(py);
        let ascending = pass % 2 == 0;

        for i in 0..per_pass {
            let offset = i * config.resolution;
            let px = if ascending {
                offset
            } else {
                region.width - offset
            };

            let column = px.min(region.width - 1);
            let brightness = map.brightness(column, py).unwrap_or(1.0);
            let amplitude = (1.0 - brightness) * max_amplitude;
            let wave = (f64::from(px) * config.frequency).sin() * amplitude;

            points.push(Point::new(
                region.origin.x + f64::from(px),
                baseline + wave,
            ));
        }
    }

    Path::new(points)
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    const TOL: f64 = 1e-9;

    fn uniform(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    fn region(width: u32, height: u32) -> Region {
        Region::new(Point::new(20.0, 30.0), width, height)
    }

    fn pass_of(point: &Point, region: &Region, config: &PathConfig) -> f64 {
        let rel = point.y - region.origin.y;
        (rel / f64::from(config.line_spacing)).round() * f64::from(config.line_spacing)
    }

    #[test]
    fn black_region_scenario() {
        let img = uniform(100, 50, 0);
        let region = region(100, 50);
        let config = PathConfig::default();
        let path = generate_sine_path(&BrightnessMap::new(&img), &region, &config);

        assert_eq!(path.len(), 250);
        for (n, p) in path.points().iter().enumerate() {
            let pass = n / 50;
            let baseline = region.origin.y + 10.0 * pass as f64;
            let px = p.x - region.origin.x;
            let expected = 5.0 * (px * 0.5).sin();
            assert!(
                ((p.y - baseline) - expected).abs() < TOL,
                "point {n}: deviation {} != {expected}",
                p.y - baseline,
            );
        }
    }

    #[test]
    fn white_region_stays_on_baseline() {
        let img = uniform(64, 40, 255);
        let region = region(64, 40);
        let config = PathConfig::default();
        let path = generate_sine_path(&BrightnessMap::new(&img), &region, &config);

        assert!(!path.is_empty());
        for p in path.points() {
            let baseline = region.origin.y + pass_of(p, &region, &config);
            assert!((p.y - baseline).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn grey_scales_amplitude() {
        // 51/255 = 0.2 brightness -> 0.8 * 5mm = 4mm peak.
        let img = uniform(40, 10, 51);
        let region = region(40, 10);
        let config = PathConfig::default();
        let path = generate_sine_path(&BrightnessMap::new(&img), &region, &config);
        for p in path.points() {
            let px = p.x - region.origin.x;
            let expected = 4.0 * (px * 0.5).sin();
            assert!(((p.y - region.origin.y) - expected).abs() < TOL);
        }
    }

    #[test]
    fn passes_alternate_direction() {
        let img = uniform(20, 30, 255);
        let region = region(20, 30);
        let config = PathConfig::default();
        let path = generate_sine_path(&BrightnessMap::new(&img), &region, &config);
        let (passes, per_pass) = scan_shape(&region, &config);
        assert_eq!((passes, per_pass), (3, 10));

        for (pass, chunk) in path.points().chunks(per_pass as usize).enumerate() {
            let xs: Vec<f64> = chunk.iter().map(|p| p.x - region.origin.x).collect();
            if pass % 2 == 0 {
                assert!(xs.windows(2).all(|w| w[1] > w[0]), "pass {pass}: {xs:?}");
                assert!(xs[0].abs() < f64::EPSILON);
            } else {
                assert!(xs.windows(2).all(|w| w[1] < w[0]), "pass {pass}: {xs:?}");
                assert!((xs[0] - 20.0).abs() < f64::EPSILON);
                assert!(xs[xs.len() - 1] > 0.0);
            }
        }
    }

    #[test]
    fn length_is_independent_of_content() {
        let region = region(37, 23);
        let config = PathConfig {
            line_spacing: 4,
            resolution: 3,
            ..PathConfig::default()
        };
        let white = uniform(37, 23, 255);
        let noise = RgbaImage::from_fn(37, 23, |x, y| {
            let v = ((x * 31 + y * 17) % 256) as u8;
            Rgba([v, 255 - v, v / 2, 255])
        });
        let a = generate_sine_path(&BrightnessMap::new(&white), &region, &config);
        let b = generate_sine_path(&BrightnessMap::new(&noise), &region, &config);
        assert_eq!(a.len(), b.len());
        // ceil(23 / 4) * ceil(37 / 3)
        assert_eq!(a.len(), 6 * 13);
    }

    #[test]
    fn generation_is_deterministic() {
        let img = RgbaImage::from_fn(30, 30, |x, y| Rgba([(x * 8) as u8, (y * 8) as u8, 0, 255]));
        let region = region(30, 30);
        let config = PathConfig::default();
        let map = BrightnessMap::new(&img);
        assert_eq!(
            generate_sine_path(&map, &region, &config),
            generate_sine_path(&map, &region, &config),
        );
    }

    #[test]
    fn odd_width_never_reads_past_the_row() {
        // Right edge differs from the rest so a wrapped read would show.
        let img = RgbaImage::from_fn(11, 20, |x, _| {
            if x == 10 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        let region = region(11, 20);
        let config = PathConfig::default();
        let path = generate_sine_path(&BrightnessMap::new(&img), &region, &config);
        assert_eq!(path.len(), 2 * 6);

        // Second pass starts at px = 11, clamped to column 10 (black).
        let start = path.points()[6];
        let px = start.x - region.origin.x;
        assert!((px - 11.0).abs() < f64::EPSILON);
        let expected = 5.0 * (11.0_f64 * 0.5).sin();
        assert!(((start.y - (region.origin.y + 10.0)) - expected).abs() < TOL);
    }

    #[test]
    fn zero_area_region_is_empty_path() {
        let img = uniform(1, 1, 0);
        let config = PathConfig::default();
        for r in [region(0, 50), region(50, 0)] {
            let path = generate_sine_path(&BrightnessMap::new(&img), &r, &config);
            assert!(path.is_empty());
        }
    }

    #[test]
    fn points_stay_within_region_band() {
        let img = uniform(50, 50, 0);
        let region = region(50, 50);
        let config = PathConfig::default();
        let path = generate_sine_path(&BrightnessMap::new(&img), &region, &config);
        let amp = config.max_amplitude();
        for p in path.points() {
            assert!(p.x >= region.origin.x && p.x <= region.origin.x + 50.0);
            assert!(p.y >= region.origin.y - amp - TOL);
            assert!(p.y <= region.origin.y + 40.0 + amp + TOL);
        }
    }
}
