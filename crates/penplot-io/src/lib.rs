//! penplot-io: Native I/O adapters for penplot.
//!
//! Provides a raster [`Surface`](penplot_playback::Surface) backed by
//! `tiny-skia` for rendering previews and finished plots to PNG, and a
//! serial port link for the (optional, status-only) hardware connection.

pub mod raster;
pub mod serial;

pub use raster::{RasterError, RasterSurface};
pub use serial::{ConnectionError, DEFAULT_BAUD, SerialLink, connect_with_status, list_ports};
