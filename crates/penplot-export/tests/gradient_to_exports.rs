//! Integration test: run a synthesized gradient image through the full pipeline and export to SVG and G-code.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use penplot_export::{GcodeMetadata, SvgMetadata};
use penplot_pipeline::{MachineBounds, PathConfig};

/// Horizontal black-to-white gradient encoded as PNG.
fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        let v = u8::try_from(x * 255 / (width - 1)).unwrap();
        Rgba([v, v, v, 255])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[test]
fn gradient_pipeline_to_svg_and_gcode() {
    let bytes = gradient_png(120, 80);
    let bounds = MachineBounds::default();
    let config = PathConfig::default();
    let result =
        penplot_pipeline::process(&bytes, &bounds, &config).expect("pipeline should succeed");

    eprintln!(
        "Pipeline produced {} points, region {}x{} at ({}, {})",
        result.path.len(),
        result.region.width,
        result.region.height,
        result.region.origin.x,
        result.region.origin.y,
    );
    assert!(!result.path.is_empty());
    assert!(result.path.points().iter().all(|p| {
        p.x >= 0.0 && p.x <= bounds.width && p.y >= 0.0 && p.y <= bounds.height
    }));

    let svg = penplot_export::to_svg(
        &result.path,
        &bounds,
        &SvgMetadata {
            title: Some("gradient"),
            ..SvgMetadata::default()
        },
    );
    assert!(svg.contains("<svg"));
    assert_eq!(svg.matches("<path").count(), 1);
    assert!(svg.contains("</svg>"));

    let gcode = penplot_export::to_gcode(&result.path, &GcodeMetadata::default());
    let moves = gcode
        .lines()
        .filter(|l| l.starts_with("G0 ") || l.starts_with("G1 "))
        .count();
    assert_eq!(moves, result.path.len());
}

#[test]
fn dark_side_swings_wider_than_light_side() {
    let bytes = gradient_png(120, 80);
    let config = PathConfig {
        line_spacing: 20,
        ..PathConfig::default()
    };
    let result = penplot_pipeline::process(&bytes, &MachineBounds::default(), &config).unwrap();
    let region = result.region;
    let left_edge = region.origin.x + f64::from(region.width) * 0.2;
    let right_edge = region.origin.x + f64::from(region.width) * 0.8;

    // First pass runs left to right around the top of the region.
    let centre = region.origin.y;
    let (_, per_pass) = penplot_pipeline::sine::scan_shape(&region, &config);
    let first_pass: Vec<_> = result
        .path
        .points()
        .iter()
        .take(per_pass as usize)
        .collect();
    let swing = |keep: &dyn Fn(f64) -> bool| {
        first_pass
            .iter()
            .filter(|p| keep(p.x))
            .map(|p| (p.y - centre).abs())
            .fold(0.0_f64, f64::max)
    };
    let dark = swing(&|x| x < left_edge);
    let light = swing(&|x| x > right_edge);
    assert!(dark > light, "dark {dark} should exceed light {light}");
}
