//! Debouncing for search-as-you-type
//!
//! The event loop polls on a short interval, so instead of timers the
//! debouncer records when input last changed and reports when the quiet
//! period has elapsed.

use std::time::{Duration, Instant};

/// Quiet period before a search is applied
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Fires once after input has been quiet for `wait`
#[derive(Debug, Clone)]
pub struct Debouncer {
    wait: Duration,
    last_input: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            last_input: None,
        }
    }

    /// Records an input event, restarting the quiet period
    pub fn touch(&mut self, now: Instant) {
        self.last_input = Some(now);
    }

    /// Whether an input is waiting for its quiet period to end
    pub fn is_pending(&self) -> bool {
        self.last_input.is_some()
    }

    /// Returns true exactly once when the quiet period after the last input has elapsed
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last_input {
            Some(last) if now.duration_since(last) >= self.wait => {
                self.last_input = None;
                true
            }
            _ => false,
        }
    }

    /// Drops any pending input, e.g. when it was applied directly
    pub fn cancel(&mut self) {
        self.last_input = None;
    }
}
