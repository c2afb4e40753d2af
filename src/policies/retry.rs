//! # Retry policy for facade polls.
//!
//! [`RetryPolicy`] bounds how often a failed poll is reattempted within one
//! cycle and how long to wait between attempts. The delay for attempt `n`
//! (0-indexed) is `base_delay × 2ⁿ`, clamped to [`RetryPolicy::max_delay`].
//! Delays are deterministic: with a single poller per facade there is no
//! thundering-herd concern to randomize away.
//!
//! Exhausting `max_attempts` skips the cycle entirely; the caller keeps its
//! previous state and retries at the next regular interval, so a poll outage
//! can never manufacture spurious observations.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use gamevisor::RetryPolicy;
//!
//! let retry = RetryPolicy {
//!     max_attempts: 4,
//!     base_delay: Duration::from_millis(500),
//!     max_delay: Duration::from_secs(10),
//! };
//!
//! assert_eq!(retry.delay_for(0), Duration::from_millis(500));
//! assert_eq!(retry.delay_for(1), Duration::from_secs(1));
//! assert_eq!(retry.delay_for(2), Duration::from_secs(2));
//! // 500ms × 2^10 = 512s → capped at max_delay
//! assert_eq!(retry.delay_for(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

/// Bounded exponential-backoff policy for poll retries.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total attempts per cycle, including the first (`>= 1`).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
    /// Cap applied to every computed delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// Returns a policy with:
    /// - `max_attempts = 3`;
    /// - `base_delay = 5s`;
    /// - `max_delay = 30s`.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Computes the backoff delay for the given attempt number (0-indexed).
    ///
    /// The base delay is `base_delay × 2^attempt`, clamped to
    /// [`RetryPolicy::max_delay`]. Overflowing or non-finite intermediate
    /// values clamp to the cap as well.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let max_secs = self.max_delay.as_secs_f64();
        let clamped_exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.base_delay.as_secs_f64() * 2.0f64.powi(clamped_exp);

        if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
            self.max_delay
        } else {
            Duration::from_secs_f64(unclamped_secs)
        }
    }

    /// True when `attempt` (0-indexed) was the last allowed attempt.
    #[inline]
    pub fn is_last_attempt(&self, attempt: u32) -> bool {
        attempt + 1 >= self.max_attempts.max(1)
    }
}
