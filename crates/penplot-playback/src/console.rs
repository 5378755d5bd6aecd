//! Bounded console log.
//!
//! Append-only line sink: once `capacity` lines are held, each new line
//! evicts the oldest. Every line is also emitted as a `tracing` event so
//! hosts that only watch the log output still see it.

use std::collections::VecDeque;

/// Bounded, append-only history of console lines.
#[derive(Debug, Clone)]
pub struct Console {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Console {
    /// Create a console holding at most `capacity` lines (minimum 1).
    ///
    /// Storage grows with the lines actually pushed, so a huge capacity
    /// costs nothing up front.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a line, evicting the oldest if full.
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!(target: "penplot::console", "{line}");
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Lines from oldest to newest.
    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.lines.iter().map(String::as_str)
    }

    /// Newest line, the one a scrolled-to-bottom view shows last.
    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    /// Number of lines held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// `true` if no lines are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Maximum number of lines held.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let mut console = Console::new(10);
        console.push("a");
        console.push(String::from("b"));
        assert_eq!(console.lines().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(console.latest(), Some("b"));
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut console = Console::new(50);
        for i in 0..60 {
            console.push(format!("line {i}"));
        }
        assert_eq!(console.len(), 50);
        assert_eq!(console.lines().next(), Some("line 10"));
        assert_eq!(console.latest(), Some("line 59"));
    }

    #[test]
    fn zero_capacity_keeps_one_line() {
        let mut console = Console::new(0);
        console.push("first");
        console.push("second");
        assert_eq!(console.capacity(), 1);
        assert_eq!(console.lines().collect::<Vec<_>>(), ["second"]);
    }

    #[test]
    fn huge_capacity_does_not_reserve() {
        let mut console = Console::new(usize::MAX);
        console.push("only");
        assert_eq!(console.capacity(), usize::MAX);
        assert_eq!(console.len(), 1);
    }

    #[test]
    fn starts_empty() {
        let console = Console::new(3);
        assert!(console.is_empty());
        assert_eq!(console.latest(), None);
    }
}
