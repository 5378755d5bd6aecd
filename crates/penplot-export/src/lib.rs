//! penplot-export: Pure format serializers (sans-IO)
//!
//! Converts a generated toolpath into output formats: SVG for viewing
//! and printing, and a mock G-code program for motion controllers.

pub mod gcode;
pub mod svg;

pub use gcode::{GcodeMetadata, motion_command, to_gcode};
pub use svg::{SvgMetadata, build_path_data, to_svg};
