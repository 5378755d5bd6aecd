//! Playback state machine.
//!
//! ```text
//!            start              tick (next == last)
//!   Idle ──────────► Running ─────────────────────► Complete
//!    ▲                │   ▲                             │
//!    │          pause │   │ resume                      │ start
//!    │                ▼   │                             │
//!    │              Paused                              ▼
//!    └──── stop ──── (any) ◄──────────────────────── Running
//! ```
//!
//! [`Playback`] only tracks indices into a [`Path`]; it never draws.
//! Each [`Playback::tick`] reports which span of the path was traversed
//! so a renderer can draw it.

use penplot_pipeline::Path;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a playback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing is plotting. Initial state, and the state after stop.
    #[default]
    Idle,
    /// Advancing one step per tick.
    Running,
    /// Holding position; ticks re-poll without advancing.
    Paused,
    /// The last point has been drawn.
    Complete,
}

impl PlaybackState {
    /// `true` while a run is in progress (running or paused).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

/// Tunables for playback speed and logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Initial speed, `1..=100`.
    pub speed: u32,

    /// Points advanced per tick are `ceil(speed / speed_divisor)`.
    pub speed_divisor: u32,

    /// Emit a motion log line every this many steps (0 disables).
    pub log_every: u32,

    /// Lines kept in the console before the oldest are evicted.
    pub console_capacity: usize,

    /// Extra per-frame delay in milliseconds at low speed, if any.
    pub low_speed_delay_ms: Option<u64>,

    /// Speeds strictly below this use `low_speed_delay_ms`.
    pub low_speed_threshold: u32,
}

impl PlaybackConfig {
    /// Slowest accepted speed.
    pub const MIN_SPEED: u32 = 1;
    /// Fastest accepted speed.
    pub const MAX_SPEED: u32 = 100;
    /// Default speed.
    pub const DEFAULT_SPEED: u32 = 50;
    /// Default speed divisor.
    pub const DEFAULT_SPEED_DIVISOR: u32 = 10;
    /// Default motion log interval in steps.
    pub const DEFAULT_LOG_EVERY: u32 = 20;
    /// Default console history.
    pub const DEFAULT_CONSOLE_CAPACITY: usize = 50;
    /// Default low-speed threshold.
    pub const DEFAULT_LOW_SPEED_THRESHOLD: u32 = 20;
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: Self::DEFAULT_SPEED,
            speed_divisor: Self::DEFAULT_SPEED_DIVISOR,
            log_every: Self::DEFAULT_LOG_EVERY,
            console_capacity: Self::DEFAULT_CONSOLE_CAPACITY,
            low_speed_delay_ms: None,
            low_speed_threshold: Self::DEFAULT_LOW_SPEED_THRESHOLD,
        }
    }
}

/// Clamp a requested speed into `MIN_SPEED..=MAX_SPEED`.
#[must_use]
pub const fn clamp_speed(speed: u32) -> u32 {
    if speed < PlaybackConfig::MIN_SPEED {
        PlaybackConfig::MIN_SPEED
    } else if speed > PlaybackConfig::MAX_SPEED {
        PlaybackConfig::MAX_SPEED
    } else {
        speed
    }
}

/// Errors surfaced to the user by playback commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// Start was requested before any path was generated.
    #[error("no path generated, load an image first")]
    EmptyPath,
}

/// One traversed span of the path.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Index the head started from.
    pub from: usize,
    /// Index the head moved to (`from` for a one-point path).
    pub to: usize,
    /// Motion command to log for this step, if it falls on the interval.
    pub log_line: Option<String>,
    /// This step reached the last point and ended the run.
    pub completed: bool,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// Not running; nothing to do and nothing to reschedule.
    Idle,
    /// Paused; poll again next frame.
    Paused,
    /// The head advanced.
    Advanced(Step),
}

/// Playback cursor over a path.
#[derive(Debug, Clone)]
pub struct Playback {
    state: PlaybackState,
    index: usize,
    speed: u32,
    steps: u64,
    speed_divisor: u32,
    log_every: u32,
}

impl Playback {
    /// Create an idle playback at index 0.
    #[must_use]
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            state: PlaybackState::Idle,
            index: 0,
            speed: clamp_speed(config.speed),
            steps: 0,
            speed_divisor: config.speed_divisor.max(1),
            log_every: config.log_every,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    /// Index of the point the head is at.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Current speed.
    #[must_use]
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Steps taken in the current run.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Points advanced per step at the current speed (at least 1).
    #[must_use]
    pub const fn stride(&self) -> usize {
        let stride = self.speed.div_ceil(self.speed_divisor);
        if stride == 0 { 1 } else { stride as usize }
    }

    /// Change the speed; applies from the next tick.
    pub const fn set_speed(&mut self, speed: u32) {
        self.speed = clamp_speed(speed);
    }

    /// Begin a run over a path of `path_len` points.
    ///
    /// Returns `Ok(true)` when a run started, `Ok(false)` when one was
    /// already in progress (the request is ignored).
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::EmptyPath`] if `path_len` is zero. The
    /// state is left unchanged.
    pub const fn start(&mut self, path_len: usize) -> Result<bool, PlaybackError> {
        if path_len == 0 {
            return Err(PlaybackError::EmptyPath);
        }
        if self.state.is_active() {
            return Ok(false);
        }
        self.state = PlaybackState::Running;
        self.index = 0;
        self.steps = 0;
        Ok(true)
    }

    /// Toggle between running and paused.
    ///
    /// Returns the new state, or `None` if no run is in progress.
    pub const fn toggle_pause(&mut self) -> Option<PlaybackState> {
        self.state = match self.state {
            PlaybackState::Running => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Running,
            PlaybackState::Idle | PlaybackState::Complete => return None,
        };
        Some(self.state)
    }

    /// Return to idle at index 0. Returns the state that was left.
    pub const fn stop(&mut self) -> PlaybackState {
        let previous = self.state;
        self.state = PlaybackState::Idle;
        self.index = 0;
        self.steps = 0;
        previous
    }

    /// Advance one step along `path`.
    ///
    /// The head moves `stride()` points, clamped to the last index.
    /// Reaching the last index moves the state to
    /// [`PlaybackState::Complete`]; that happens exactly once per run.
    pub fn tick(&mut self, path: &Path) -> Tick {
        match self.state {
            PlaybackState::Idle | PlaybackState::Complete => return Tick::Idle,
            PlaybackState::Paused => return Tick::Paused,
            PlaybackState::Running => {}
        }

        let Some(last) = path.last_index() else {
            // Path vanished under a running playback; nothing to traverse.
            self.stop();
            return Tick::Idle;
        };

        let from = self.index.min(last);
        let to = from.saturating_add(self.stride()).min(last);

        let log_line = if self.log_every > 0 && self.steps % u64::from(self.log_every) == 0 {
            path.get(to).map(penplot_export::gcode::motion_command)
        } else {
            None
        };

        self.index = to;
        self.steps += 1;
        let completed = to == last;
        if completed {
            self.state = PlaybackState::Complete;
        }

        Tick::Advanced(Step {
            from,
            to,
            log_line,
            completed,
        })
    }
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}
