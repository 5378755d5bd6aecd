//! penplot-playback: Simulated plotting of a generated toolpath (sans-IO).
//!
//! Walks a [`Path`](penplot_pipeline::Path) a few points per frame,
//! pausing, resuming and stopping on command, and reports what to draw
//! as [`DrawIntent`]s. The host owns the clock and the drawing surface:
//! it waits for a frame, calls [`Session::on_frame`] with the pending
//! [`TaskHandle`], and renders the returned intents.

pub mod console;
pub mod playback;
pub mod schedule;
pub mod session;
pub mod surface;

pub use console::Console;
pub use playback::{Playback, PlaybackConfig, PlaybackError, PlaybackState, Step, Tick};
pub use schedule::{FrameDelay, FrameLoop, TaskHandle};
pub use session::{ConnectionStatus, Session};
pub use surface::{Color, DrawIntent, RecordingSurface, Scene, StrokeStyle, Surface};
