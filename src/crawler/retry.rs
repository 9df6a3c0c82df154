//! Fixed-delay retry policy for fetches
//!
//! The policy is a plain value: the fetcher asks it, after each failed
//! attempt, whether and how long to wait before trying again. Keeping the
//! decision here makes it testable without any network.

use crate::config::FetcherConfig;
use std::time::Duration;

/// Default maximum attempts, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between attempts.
const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Default cap on the time spent on one URL before giving up.
const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(5);

/// Retry behaviour with a fixed delay and a total time budget
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `delay`: 1 second
/// - `max_elapsed`: 5 seconds
///
/// A retry is only scheduled when both the attempt count and the elapsed
/// budget allow it, counting the upcoming delay against the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
            max_elapsed: DEFAULT_MAX_ELAPSED,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, delay: Duration, max_elapsed: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            max_elapsed,
        }
    }

    pub fn from_config(config: &FetcherConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.retry_delay(),
            config.max_retry_elapsed(),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn max_elapsed(&self) -> Duration {
        self.max_elapsed
    }

    /// Delay to wait before the next attempt, or `None` to give up
    ///
    /// # Arguments
    ///
    /// * `attempts_made` - Attempts already performed (1 after the first failure)
    /// * `elapsed` - Time since the first attempt started
    pub fn next_delay(&self, attempts_made: u32, elapsed: Duration) -> Option<Duration> {
        if attempts_made >= self.max_attempts {
            return None;
        }

        if elapsed + self.delay > self.max_elapsed {
            return None;
        }

        Some(self.delay)
    }
}
