//! Retry policy for completion calls.
//!
//! The policy is explicit state plus a pluggable backoff: the caller owns a
//! [`RetryState`], records each failure into it, and asks the policy how long
//! to wait before the next attempt.
//!
//! ```
//! use conformity_application::config::{Backoff, RetryPolicy, RetryState};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3, Backoff::exponential(Duration::from_secs(1), Duration::from_secs(3)));
//! let mut state = RetryState::default();
//!
//! state.record_failure("timeout");
//! assert_eq!(policy.next_delay(&state), Some(Duration::from_secs(1)));
//! state.record_failure("timeout");
//! assert_eq!(policy.next_delay(&state), Some(Duration::from_secs(2)));
//! state.record_failure("timeout");
//! assert_eq!(policy.next_delay(&state), None); // attempts exhausted
//! ```

use std::time::Duration;

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failure
    Fixed(Duration),
    /// Doubling delay starting at `initial`, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    pub fn fixed(delay: Duration) -> Self {
        Backoff::Fixed(delay)
    }

    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Backoff::Exponential {
            initial,
            max: max.max(initial),
        }
    }

    /// Delay after the `failures`-th consecutive failure (1-based)
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let shift = failures.saturating_sub(1).min(31);
                initial.saturating_mul(1u32 << shift).min(max)
            }
        }
    }
}

/// How many attempts a call gets and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            backoff: Backoff::Fixed(Duration::from_secs(2)),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// No waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Backoff::Fixed(Duration::ZERO))
    }

    /// Delay before the next attempt, or `None` once attempts are spent
    pub fn next_delay(&self, state: &RetryState) -> Option<Duration> {
        if state.attempt >= self.max_attempts {
            None
        } else {
            Some(self.backoff.delay(state.attempt))
        }
    }
}

/// Progress of one retried call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Attempts made so far
    pub attempt: u32,
    /// Message of the most recent failure
    pub last_error: Option<String>,
}

impl RetryState {
    pub fn record_failure(&mut self, error: impl ToString) {
        self.attempt += 1;
        self.last_error = Some(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_benchmark_settings() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 50);
        assert_eq!(policy.backoff, Backoff::Fixed(Duration::from_secs(2)));
    }

    #[test]
    fn test_fixed_backoff_until_exhausted() {
        let policy = RetryPolicy::new(2, Backoff::fixed(Duration::from_millis(5)));
        let mut state = RetryState::default();
        state.record_failure("boom");
        assert_eq!(policy.next_delay(&state), Some(Duration::from_millis(5)));
        state.record_failure("boom again");
        assert_eq!(policy.next_delay(&state), None);
        assert_eq!(state.last_error.as_deref(), Some("boom again"));
    }

    #[test]
    fn test_exponential_caps_at_max() {
        let backoff = Backoff::exponential(Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(backoff.delay(1), Duration::from_secs(1));
        assert_eq!(backoff.delay(3), Duration::from_secs(4));
        assert_eq!(backoff.delay(4), Duration::from_secs(5));
        assert_eq!(backoff.delay(200), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::immediate(0).max_attempts, 1);
    }
}
