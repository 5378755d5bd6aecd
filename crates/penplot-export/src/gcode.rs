//! G-code export serializer.
//!
//! Converts a toolpath into a mock motion program: a block of `;`
//! comments, unit and positioning setup, a rapid move to the first
//! point, then one linear move per following point.
//!
//! ```text
//! ; penplot
//! ; Source: portrait
//! G21
//! G90
//! G0 X110.0 Y45.0
//! G1 X112.0 Y44.1
//! ...
//! ```
//!
//! Coordinates are machine millimetres with one decimal place, the same
//! format the playback console shows. No pen-lift or feed-rate commands
//! are emitted: the path is a single continuous stroke.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use penplot_pipeline::{Path, Point};

/// Metadata to embed as `;`-prefixed comment lines at the top of the
/// program.
///
/// All fields are optional. Multi-line values become one comment line
/// per input line.
#[derive(Debug, Clone, Default)]
pub struct GcodeMetadata<'a> {
    /// Source image name, emitted as `; Source: <title>`.
    pub title: Option<&'a str>,

    /// Human-readable parameters, emitted as `; <description>`.
    pub description: Option<&'a str>,

    /// Export timestamp, emitted as `; Exported: <timestamp>`.
    pub timestamp: Option<&'a str>,

    /// Path configuration JSON, emitted as `; Config: <json>`.
    pub config_json: Option<&'a str>,
}

/// Format a linear move to `point`.
///
/// # Examples
///
/// ```
/// use penplot_pipeline::Point;
/// use penplot_export::gcode::motion_command;
///
/// assert_eq!(motion_command(&Point::new(12.34, 5.0)), "G1 X12.3 Y5.0");
/// ```
#[must_use]
pub fn motion_command(point: &Point) -> String {
    format!("G1 X{:.1} Y{:.1}", point.x, point.y)
}

/// Serialize a toolpath into a G-code program.
///
/// An empty path yields only the header and setup lines.
#[must_use]
pub fn to_gcode(path: &Path, metadata: &GcodeMetadata<'_>) -> String {
    let mut out = String::new();

    // --- Header ---
    let _ = writeln!(out, "; penplot");
    let comments = [
        ("Source: ", metadata.title),
        ("", metadata.description),
        ("Exported: ", metadata.timestamp),
        ("Config: ", metadata.config_json),
    ];
    for (label, value) in comments {
        if let Some(value) = value {
            for line in value.lines() {
                let _ = writeln!(out, "; {label}{line}");
            }
        }
    }
    let _ = writeln!(out, "; {} points", path.len());

    // --- Setup ---
    let _ = writeln!(out, "G21");
    let _ = writeln!(out, "G90");

    // --- Motion ---
    let mut points = path.points().iter();
    if let Some(first) = points.next() {
        let _ = writeln!(out, "G0 X{:.1} Y{:.1}", first.x, first.y);
    }
    for point in points {
        let _ = writeln!(out, "{}", motion_command(point));
    }

    out
}
