//! Frame task loop.
//!
//! A session owns at most one pending frame task. The host waits for its
//! next frame (and, at low speed, an extra [`FrameDelay`]) and then hands
//! the [`TaskHandle`] back to the session. Handles carry a generation
//! number: scheduling or cancelling invalidates every older handle, so a
//! step queued by a previous run can never fire into a new one.

use std::time::Duration;

/// Ticket for one scheduled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    generation: u64,
}

impl TaskHandle {
    /// Generation number of this handle.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// Single-slot scheduler for frame tasks.
#[derive(Debug, Default)]
pub struct FrameLoop {
    pending: Option<TaskHandle>,
    next_generation: u64,
}

impl FrameLoop {
    /// Create an empty loop.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: None,
            next_generation: 0,
        }
    }

    /// Schedule a new frame task, replacing any pending one.
    pub const fn schedule(&mut self) -> TaskHandle {
        let handle = TaskHandle {
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.pending = Some(handle);
        handle
    }

    /// Cancel the pending task, returning it if there was one.
    pub const fn cancel(&mut self) -> Option<TaskHandle> {
        self.pending.take()
    }

    /// The task waiting to run, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<TaskHandle> {
        self.pending
    }

    /// Claim `handle` for execution.
    ///
    /// Returns `true` and clears the slot only if `handle` is the pending
    /// task. Stale or cancelled handles return `false`.
    pub fn take_if_current(&mut self, handle: TaskHandle) -> bool {
        if self.pending == Some(handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

/// Extra wait inserted between frames when playing slowly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDelay {
    /// Speeds strictly below this are delayed.
    pub threshold: u32,
    /// Delay added per frame.
    pub delay: Duration,
}

impl FrameDelay {
    /// Delay to add at `speed`, if any.
    #[must_use]
    pub fn for_speed(&self, speed: u32) -> Option<Duration> {
        (speed < self.threshold).then_some(self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_replaces_pending() {
        let mut frames = FrameLoop::new();
        let first = frames.schedule();
        let second = frames.schedule();
        assert_ne!(first, second);
        assert_eq!(frames.pending(), Some(second));
        assert!(!frames.take_if_current(first));
        assert!(frames.take_if_current(second));
        assert_eq!(frames.pending(), None);
    }

    #[test]
    fn cancelled_handle_never_runs() {
        let mut frames = FrameLoop::new();
        let handle = frames.schedule();
        assert_eq!(frames.cancel(), Some(handle));
        assert!(!frames.take_if_current(handle));
    }

    #[test]
    fn handle_runs_only_once() {
        let mut frames = FrameLoop::new();
        let handle = frames.schedule();
        assert!(frames.take_if_current(handle));
        assert!(!frames.take_if_current(handle));
    }

    #[test]
    fn generations_increase_across_cancel() {
        let mut frames = FrameLoop::new();
        let a = frames.schedule();
        frames.cancel();
        let b = frames.schedule();
        assert!(b.generation() > a.generation());
    }

    #[test]
    fn frame_delay_applies_below_threshold() {
        let delay = FrameDelay {
            threshold: 20,
            delay: Duration::from_millis(50),
        };
        assert_eq!(delay.for_speed(5), Some(Duration::from_millis(50)));
        assert_eq!(delay.for_speed(20), None);
        assert_eq!(delay.for_speed(90), None);
    }
}
