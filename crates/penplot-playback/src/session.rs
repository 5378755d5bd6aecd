//! Plotter session: the context object every command goes through.
//!
//! A [`Session`] owns everything one control panel needs: machine size,
//! generation settings, the loaded image, the generated path, playback
//! state, the pending frame task and the console. Nothing is global, so
//! independent sessions never interfere.
//!
//! Commands return [`DrawIntent`]s; call [`Session::render`] to apply
//! them to a [`Surface`].

use std::time::Duration;

use penplot_pipeline::{
    MachineBounds, Path, PathConfig, PipelineError, ProcessResult, Region, RgbaImage,
};

use crate::console::Console;
use crate::playback::{Playback, PlaybackConfig, PlaybackError, PlaybackState, Tick};
use crate::schedule::{FrameDelay, FrameLoop, TaskHandle};
use crate::surface::{self, DrawIntent, Scene, Surface};

/// Outcome of the most recent hardware connection attempt.
///
/// Purely informational: generation and playback never consult it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No attempt made, or disconnected.
    #[default]
    Disconnected,
    /// Connected to the named port.
    Connected(String),
    /// The last attempt failed with this message.
    Failed(String),
}

/// An image that has been loaded into the session.
#[derive(Debug, Clone)]
struct Loaded {
    name: String,
    image: RgbaImage,
    result: ProcessResult,
}

/// One plotter control panel's worth of state.
#[derive(Debug)]
pub struct Session {
    bounds: MachineBounds,
    path_config: PathConfig,
    frame_delay: Option<FrameDelay>,
    loaded: Option<Loaded>,
    empty_path: Path,
    playback: Playback,
    frames: FrameLoop,
    console: Console,
    connection: ConnectionStatus,
}

impl Session {
    /// Create a session with no image loaded.
    #[must_use]
    pub fn new(
        bounds: MachineBounds,
        path_config: PathConfig,
        playback_config: &PlaybackConfig,
    ) -> Self {
        let frame_delay = playback_config.low_speed_delay_ms.map(|ms| FrameDelay {
            threshold: playback_config.low_speed_threshold,
            delay: Duration::from_millis(ms),
        });
        Self {
            bounds,
            path_config,
            frame_delay,
            loaded: None,
            empty_path: Path::default(),
            playback: Playback::new(playback_config),
            frames: FrameLoop::new(),
            console: Console::new(playback_config.console_capacity),
            connection: ConnectionStatus::Disconnected,
        }
    }

    // --- accessors ---

    /// Machine bounds.
    #[must_use]
    pub const fn bounds(&self) -> &MachineBounds {
        &self.bounds
    }

    /// Generation settings.
    #[must_use]
    pub const fn path_config(&self) -> &PathConfig {
        &self.path_config
    }

    /// Current toolpath; empty when nothing is loaded.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.loaded
            .as_ref()
            .map_or(&self.empty_path, |l| &l.result.path)
    }

    /// Where the loaded image sits on the machine.
    #[must_use]
    pub fn region(&self) -> Option<&Region> {
        self.loaded.as_ref().map(|l| &l.result.region)
    }

    /// Name of the loaded image.
    #[must_use]
    pub fn image_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.name.as_str())
    }

    /// Playback cursor.
    #[must_use]
    pub const fn playback(&self) -> &Playback {
        &self.playback
    }

    /// Console history.
    #[must_use]
    pub const fn console(&self) -> &Console {
        &self.console
    }

    /// Last connection outcome.
    #[must_use]
    pub const fn connection(&self) -> &ConnectionStatus {
        &self.connection
    }

    /// The frame task waiting to run, if any.
    #[must_use]
    pub const fn pending_task(&self) -> Option<TaskHandle> {
        self.frames.pending()
    }

    /// Extra wait the host should add before the next frame.
    #[must_use]
    pub fn frame_delay(&self) -> Option<Duration> {
        self.frame_delay
            .and_then(|d| d.for_speed(self.playback.speed()))
    }

    // --- commands ---

    /// Decode `bytes`, place and convert the image, and make the result
    /// the session's path. Any run in progress is stopped.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error if decoding or generation fails. The
    /// previously loaded image and path are kept in that case.
    pub fn load_image(
        &mut self,
        name: &str,
        bytes: &[u8],
    ) -> Result<Vec<DrawIntent>, PipelineError> {
        self.console.push("Processing image...");
        let image = penplot_pipeline::decode::decode(bytes)
            .inspect_err(|e| self.report_load_failure(name, e))?;
        let result = penplot_pipeline::process_image(&image, &self.bounds, &self.path_config)
            .inspect_err(|e| self.report_load_failure(name, e))?;

        self.halt();
        let points = result.path.len();
        self.loaded = Some(Loaded {
            name: name.to_owned(),
            image,
            result,
        });
        self.console.push(format!("Loaded: {name}"));
        self.console.push(format!("Generated {points} points."));
        Ok(vec![DrawIntent::Redraw])
    }

    /// Drop the image and path.
    pub fn clear(&mut self) -> Vec<DrawIntent> {
        self.halt();
        self.loaded = None;
        self.console.push("Canvas cleared.");
        vec![DrawIntent::Redraw]
    }

    /// Change the machine size, regenerating the path if an image is
    /// loaded. Any run in progress is stopped.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for non-positive sizes;
    /// the session is unchanged.
    pub fn set_machine_size(
        &mut self,
        width: f64,
        height: f64,
    ) -> Result<Vec<DrawIntent>, PipelineError> {
        let bounds = MachineBounds::new(width, height);
        bounds.validate()?;

        if let Some(loaded) = &self.loaded {
            let result = penplot_pipeline::process_image(&loaded.image, &bounds, &self.path_config)?;
            self.halt();
            let points = result.path.len();
            if let Some(loaded) = &mut self.loaded {
                loaded.result = result;
            }
            self.console
                .push(format!("Machine resized to {width}x{height}mm, {points} points."));
        } else {
            self.console
                .push(format!("Machine resized to {width}x{height}mm."));
        }
        self.bounds = bounds;
        Ok(vec![DrawIntent::Redraw])
    }

    /// Start plotting from the first point.
    ///
    /// Any pending frame from an earlier run is cancelled first. Starting
    /// while a run is in progress does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::EmptyPath`] when no path is loaded; a
    /// warning is written to the console and nothing else changes.
    pub fn start(&mut self) -> Result<Vec<DrawIntent>, PlaybackError> {
        let len = self.path().len();
        match self.playback.start(len) {
            Err(e) => {
                tracing::warn!("{e}");
                self.console.push("No path generated! Load an image first.");
                Err(e)
            }
            Ok(false) => Ok(Vec::new()),
            Ok(true) => {
                self.frames.cancel();
                self.frames.schedule();
                self.console.push("Starting plot...");
                Ok(vec![DrawIntent::Redraw])
            }
        }
    }

    /// Pause a running plot or resume a paused one.
    ///
    /// Returns the new state, or `None` if nothing is plotting.
    pub fn toggle_pause(&mut self) -> Option<PlaybackState> {
        let state = self.playback.toggle_pause()?;
        self.console.push(if state == PlaybackState::Paused {
            "Plot paused."
        } else {
            "Plot resumed."
        });
        Some(state)
    }

    /// Stop plotting: cancel the pending frame, reset to the first point
    /// and restore the base drawing.
    pub fn stop(&mut self) -> Vec<DrawIntent> {
        self.halt();
        self.console.push("Plot stopped.");
        vec![DrawIntent::Redraw]
    }

    /// Change the playback speed (clamped to `1..=100`).
    pub const fn set_speed(&mut self, speed: u32) {
        self.playback.set_speed(speed);
    }

    /// Record the outcome of a hardware connection attempt.
    pub fn set_connection(&mut self, status: ConnectionStatus) {
        match &status {
            ConnectionStatus::Connected(port) => {
                self.console.push(format!("Connected via serial: {port}"));
            }
            ConnectionStatus::Failed(message) => {
                tracing::warn!("serial connection failed: {message}");
                self.console.push(format!("Connection Failed: {message}"));
            }
            ConnectionStatus::Disconnected => self.console.push("Disconnected."),
        }
        self.connection = status;
    }

    /// Run the frame task identified by `handle`.
    ///
    /// Stale handles (cancelled, replaced, or already run) are ignored.
    /// While the run stays active the next frame is scheduled before
    /// returning.
    pub fn on_frame(&mut self, handle: TaskHandle) -> Vec<DrawIntent> {
        if !self.frames.take_if_current(handle) {
            tracing::debug!(generation = handle.generation(), "ignoring stale frame");
            return Vec::new();
        }

        let tick = match &self.loaded {
            Some(loaded) => self.playback.tick(&loaded.result.path),
            None => self.playback.tick(&self.empty_path),
        };

        match tick {
            Tick::Idle => Vec::new(),
            Tick::Paused => {
                self.frames.schedule();
                Vec::new()
            }
            Tick::Advanced(step) => {
                if let Some(line) = step.log_line {
                    self.console.push(line);
                }
                if step.completed {
                    self.console.push("Plot complete!");
                } else {
                    self.frames.schedule();
                }
                if step.from < step.to {
                    vec![DrawIntent::Segment {
                        from: step.from,
                        to: step.to,
                    }]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Apply `intents` to `surface` using this session's scene.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S, intents: &[DrawIntent]) {
        surface::render(surface, &self.scene(), intents);
    }

    /// Clear `surface` and draw the grid, faint preview and full path.
    pub fn redraw<S: Surface + ?Sized>(&self, surface: &mut S) {
        surface::draw_base(surface, &self.scene());
    }

    /// Borrow the current scene for drawing.
    #[must_use]
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            bounds: &self.bounds,
            path: self.path(),
            preview: self
                .loaded
                .as_ref()
                .map(|l| (&l.image, &l.result.region)),
        }
    }

    /// Cancel the pending frame and reset playback, without logging.
    fn halt(&mut self) {
        self.frames.cancel();
        self.playback.stop();
    }

    fn report_load_failure(&mut self, name: &str, error: &PipelineError) {
        tracing::warn!("failed to load {name}: {error}");
        self.console.push(format!("Failed to load {name}: {error}"));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(
            MachineBounds::default(),
            PathConfig::default(),
            &PlaybackConfig::default(),
        )
    }
}
