//! Damping of near-simultaneous dispatches of different triggers.
//!
//! Some devices deliver one physical press as two distinct events, e.g. a
//! media key that arrives both as a system-defined event and as a mouse
//! button. Only the first of them should fire.

use std::time::Duration;

/// Default window within which a second, different trigger is dropped.
pub const DEFAULT_DUPLICATE_WINDOW: Duration = Duration::from_millis(40);

/// Remembers the last dispatched trigger and when it fired.
#[derive(Debug, Clone)]
pub struct DuplicateSuppressor {
    /// Window length in nanoseconds.
    window_ns: u64,
    /// Storage key and timestamp of the last dispatch.
    last: Option<(String, u64)>,
}

impl Default for DuplicateSuppressor {
    fn default() -> Self {
        Self::new(DEFAULT_DUPLICATE_WINDOW)
    }
}

impl DuplicateSuppressor {
    /// A suppressor with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window_ns: u64::try_from(window.as_nanos()).unwrap_or(u64::MAX),
            last: None,
        }
    }

    /// True if a down-edge of `key` at `timestamp` (ns) follows a dispatch
    /// of a different trigger by less than the window.
    ///
    /// Repeats of the same trigger and timestamps that do not move forward
    /// are never suppressed.
    pub fn should_suppress(&self, key: &str, timestamp: u64) -> bool {
        match &self.last {
            Some((last_key, last_ts)) if last_key != key && timestamp > *last_ts => {
                timestamp - last_ts < self.window_ns
            }
            _ => false,
        }
    }

    /// Record a dispatch of `key` at `timestamp`.
    pub fn record(&mut self, key: &str, timestamp: u64) {
        self.last = Some((key.to_string(), timestamp));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    #[test]
    fn different_trigger_inside_window_is_suppressed() {
        let mut s = DuplicateSuppressor::default();
        assert!(!s.should_suppress("mouse:3", 0));
        s.record("mouse:3", 0);
        assert!(s.should_suppress("shortcut:0:10016", 30 * MS));
        assert!(s.should_suppress("shortcut:0:10016", 40 * MS - 1));
        assert!(!s.should_suppress("shortcut:0:10016", 40 * MS));
        assert!(!s.should_suppress("shortcut:0:10016", 41 * MS));
    }

    #[test]
    fn same_trigger_and_clock_oddities_pass() {
        let mut s = DuplicateSuppressor::default();
        s.record("mouse:3", 100 * MS);
        assert!(!s.should_suppress("mouse:3", 101 * MS));
        assert!(!s.should_suppress("mouse:4", 100 * MS));
        assert!(!s.should_suppress("mouse:4", 50 * MS));
    }

    #[test]
    fn window_is_configurable() {
        let mut s = DuplicateSuppressor::new(Duration::from_millis(5));
        s.record("mouse:3", 0);
        assert!(s.should_suppress("mouse:4", 4 * MS));
        assert!(!s.should_suppress("mouse:4", 6 * MS));
    }
}
